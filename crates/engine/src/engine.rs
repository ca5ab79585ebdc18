//! The workflow engine: admissibility decision plus atomic application.
//!
//! `attempt_transition` reads the document fresh inside a storage
//! snapshot, evaluates the transition table and guards against that
//! read, and applies `{status update, stage advance, audit append}`
//! through the same snapshot with an OCC expected-version check. Either
//! everything commits or nothing does; a concurrent writer surfaces as
//! [`TransitionError::Conflict`] and is never retried here.

use chaine_core::{
    actor_has_capability, format_reference, now_rfc3339, Action, Actor, AuditEntry, Capability,
    Document, Status,
};
use chaine_storage::ChaineStorage;

use crate::error::TransitionError;
use crate::guard::{check_amount, check_budget, check_lines, check_reason, Payload};
use crate::ledger::BudgetLedger;
use crate::notify::{EventKind, NotificationSink};
use crate::transition::{actor_may, resolve_target, rule_for, Target};

/// What an accepted transition produced.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The updated document; `None` when the transition removed it
    /// (draft delete).
    pub document: Option<Document>,
    /// The document's new OCC version.
    pub version: i64,
    pub audit: AuditEntry,
}

/// The engine, generic over its three collaborators.
pub struct WorkflowEngine<S, L, N> {
    storage: S,
    ledger: L,
    sink: N,
}

impl<S, L, N> WorkflowEngine<S, L, N>
where
    S: ChaineStorage,
    L: BudgetLedger,
    N: NotificationSink,
{
    pub fn new(storage: S, ledger: L, sink: N) -> Self {
        WorkflowEngine {
            storage,
            ledger,
            sink,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Register a new draft, with its CREATE audit entry.
    ///
    /// The creator must hold the Create capability at the document's
    /// step; the document is stamped with the actor's identity.
    pub async fn create_document(
        &self,
        mut document: Document,
        actor: &Actor,
    ) -> Result<Document, TransitionError> {
        if !actor_has_capability(actor, document.step, Capability::Create) {
            return Err(TransitionError::Unauthorized {
                actor_id: actor.id.clone(),
                action: Action::Create,
                step: document.step,
            });
        }
        check_amount(&document)?;
        document.created_by = actor.id.clone();
        let audit = AuditEntry::new(
            format!("{}-create-0", document.id),
            document.id.clone(),
            actor.id.clone(),
            Action::Create,
            now_rfc3339(),
            None,
            None,
        );
        let mut snapshot = self.storage.begin_snapshot().await?;
        if let Err(e) = self
            .storage
            .create_document(&mut snapshot, document.clone())
            .await
        {
            let _ = self.storage.abort_snapshot(snapshot).await;
            return Err(e.into());
        }
        if let Err(e) = self.storage.append_audit(&mut snapshot, audit).await {
            let _ = self.storage.abort_snapshot(snapshot).await;
            return Err(e.into());
        }
        self.storage.commit_snapshot(snapshot).await?;
        Ok(document)
    }

    /// Decide and apply one workflow transition.
    ///
    /// The caller passes the document id, not a stale copy: the engine
    /// re-reads the current state inside the snapshot so its guard
    /// check always runs against the latest persisted status.
    pub async fn attempt_transition(
        &self,
        entity_id: &str,
        action: Action,
        actor: &Actor,
        payload: &Payload,
    ) -> Result<TransitionOutcome, TransitionError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = self
            .attempt_in_snapshot(&mut snapshot, entity_id, action, actor, payload)
            .await;
        match result {
            Ok(outcome) => {
                self.storage.commit_snapshot(snapshot).await?;
                self.emit_notification(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                Err(e)
            }
        }
    }

    async fn attempt_in_snapshot(
        &self,
        snapshot: &mut S::Snapshot,
        entity_id: &str,
        action: Action,
        actor: &Actor,
        payload: &Payload,
    ) -> Result<TransitionOutcome, TransitionError> {
        let record = self
            .storage
            .get_document_for_update(snapshot, entity_id)
            .await?;
        let mut document = record.document;

        let rule = rule_for(document.status, action).ok_or(TransitionError::IllegalTransition {
            from: document.status,
            action,
        })?;

        if !actor_may(rule, &document, actor) {
            return Err(TransitionError::Unauthorized {
                actor_id: actor.id.clone(),
                action,
                step: document.step,
            });
        }

        // Guards.
        if rule.requires_reason {
            check_reason(action, payload)?;
        }
        let mut override_used = false;
        if rule.budget_check {
            check_amount(&document)?;
            check_lines(&document)?;
            override_used = check_budget(&document, &self.ledger, payload)?;
        }

        let timestamp = now_rfc3339();

        // Draft delete removes the document outright.
        if rule.target == Target::Removed {
            let audit = AuditEntry::new(
                format!("{}-delete-{}", entity_id, record.version + 1),
                entity_id,
                actor.id.clone(),
                action,
                timestamp,
                None,
                None,
            );
            self.storage
                .delete_document(snapshot, entity_id, record.version, audit.clone())
                .await?;
            return Ok(TransitionOutcome {
                document: None,
                version: record.version,
                audit,
            });
        }

        let new_status =
            resolve_target(rule, document.step).ok_or_else(|| TransitionError::Storage {
                message: format!("transition {} has no target status", action),
            })?;

        self.apply_effects(&mut document, action, new_status, payload, &timestamp)
            .await?;

        // Override justifications travel into the audit trail as the
        // entry's reason; reject/defer motifs likewise.
        let audit_reason = if override_used {
            payload.override_justification.clone()
        } else if rule.requires_reason {
            payload.reason.clone()
        } else {
            None
        };
        let audit = AuditEntry::new(
            format!("{}-{}-{}", entity_id, action.as_str().to_lowercase(), record.version + 1),
            entity_id,
            actor.id.clone(),
            action,
            timestamp,
            audit_reason,
            payload.comment.clone(),
        );

        let version = self
            .storage
            .update_document(snapshot, record.version, document.clone(), audit.clone())
            .await?;

        Ok(TransitionOutcome {
            document: Some(document),
            version,
            audit,
        })
    }

    /// Mutate the document for an accepted transition: status, stage
    /// pointer, per-transition timestamp, motif, reference.
    async fn apply_effects(
        &self,
        document: &mut Document,
        action: Action,
        new_status: Status,
        payload: &Payload,
        timestamp: &str,
    ) -> Result<(), TransitionError> {
        document.status = new_status;
        match action {
            Action::Submit => {
                // The reference is assigned exactly once, at first
                // submission; a resubmit after revision keeps it.
                if document.reference.is_none() {
                    let seq = self
                        .storage
                        .next_sequence(document.exercice, document.step.config().short_code)
                        .await?;
                    document.reference =
                        Some(format_reference(document.exercice, document.step, seq));
                }
                document.submitted_at = Some(timestamp.to_string());
            }
            Action::Verify => {
                document.verified_at = Some(timestamp.to_string());
                if new_status == Status::Validated {
                    // Single-stage workflow: verification validates.
                    document.validated_at = Some(timestamp.to_string());
                }
                advance_stage(document);
            }
            Action::Validate => {
                document.validated_at = Some(timestamp.to_string());
                advance_stage(document);
            }
            Action::Reject => {
                document.rejected_at = Some(timestamp.to_string());
                document.motif = payload.reason.clone();
            }
            Action::Defer => {
                document.deferred_at = Some(timestamp.to_string());
                document.motif = payload.reason.clone();
                document.resume_date = payload.resume_date.clone();
            }
            Action::Resume => {
                // Stage pointer deliberately untouched: the document
                // re-enters the circuit where it paused.
            }
            Action::Create | Action::Delete => {}
        }
        Ok(())
    }

    fn emit_notification(&self, outcome: &TransitionOutcome) {
        let Some(document) = &outcome.document else {
            return;
        };
        let event = match document.status {
            Status::Validated => EventKind::Validated,
            Status::Rejected => EventKind::Rejected,
            _ => return,
        };
        let recipients = vec![document.created_by.clone()];
        self.sink.notify(&document.id, event, &recipients);
    }
}

/// The stage pointer never runs past the step's stage count: a
/// defer/resume cycle replays Verify without growing the pointer.
fn advance_stage(document: &mut Document) {
    let stages = document.step.config().stages;
    document.current_validation_step = document
        .current_validation_step
        .saturating_add(1)
        .min(stages);
}
