//! Guard evaluation: the pure checks that sit between a legal table
//! entry and an applied transition.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use chaine_core::{Action, Document, Status, Step, MIN_REASON_LEN};

use crate::error::TransitionError;
use crate::ledger::{BudgetLedger, LedgerError};

/// Action-specific inputs to a transition attempt.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    /// Motif; mandatory (>= 10 chars) for reject/defer.
    pub reason: Option<String>,
    /// Free-text comment on verify/validate.
    pub comment: Option<String>,
    /// Optional expected resume date on defer (RFC 3339 date).
    pub resume_date: Option<String>,
    /// Request submission past the availability check.
    pub budget_override: bool,
    /// Mandatory (>= 10 chars) when `budget_override` is set.
    pub override_justification: Option<String>,
}

impl Payload {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Payload {
            reason: Some(reason.into()),
            ..Payload::default()
        }
    }
}

fn reason_ok(text: Option<&str>) -> bool {
    text.map(|t| t.trim().chars().count() >= MIN_REASON_LEN)
        .unwrap_or(false)
}

/// Reject/defer demand a substantive motif.
pub(crate) fn check_reason(action: Action, payload: &Payload) -> Result<(), TransitionError> {
    if reason_ok(payload.reason.as_deref()) {
        Ok(())
    } else {
        Err(TransitionError::MissingReason { action })
    }
}

/// Amounts are non-negative; a negative total never enters the
/// circuit, neither at creation nor at submission.
pub(crate) fn check_amount(document: &Document) -> Result<(), TransitionError> {
    if document.amount >= Decimal::ZERO {
        Ok(())
    } else {
        Err(TransitionError::NegativeAmount {
            entity_id: document.id.clone(),
            amount: document.amount,
        })
    }
}

/// A draft needs at least one valid line to enter the circuit.
pub(crate) fn check_lines(document: &Document) -> Result<(), TransitionError> {
    if document.has_valid_lines() {
        Ok(())
    } else {
        Err(TransitionError::NoValidLines {
            entity_id: document.id.clone(),
        })
    }
}

/// Budget-sufficiency gate on submit.
///
/// Insufficient means `amount > available`. The step's override policy
/// decides whether a justified override may pass anyway; the
/// justification then travels into the audit entry as the reason.
/// Returns true when the override path carried the submission.
pub(crate) fn check_budget(
    document: &Document,
    ledger: &dyn BudgetLedger,
    payload: &Payload,
) -> Result<bool, TransitionError> {
    let available = ledger
        .available(&document.budget_line_id)
        .map_err(|LedgerError::UnknownLine { budget_line_id }| {
            TransitionError::UnknownBudgetLine { budget_line_id }
        })?;
    if document.amount <= available {
        return Ok(false);
    }
    let config = document.step.config();
    if config.override_policy == chaine_core::OverridePolicy::Allowed
        && payload.budget_override
    {
        if reason_ok(payload.override_justification.as_deref()) {
            return Ok(true);
        }
        return Err(TransitionError::MissingReason {
            action: Action::Submit,
        });
    }
    Err(TransitionError::BudgetInsufficient {
        budget_line_id: document.budget_line_id.clone(),
        requested: document.amount,
        available,
    })
}

/// Chain-order check used at document creation: the preceding step must
/// be validated, unless the step's documented waiver applies (note AEF
/// without note SEF; procurement below the threshold).
///
/// `chain_state` maps each step of the dossier to the status of its
/// document, if one exists.
pub fn check_prerequisites(
    step: Step,
    chain_state: &BTreeMap<Step, Status>,
    amount: Decimal,
) -> Result<(), TransitionError> {
    let config = step.config();
    let Some(prerequisite) = config.prerequisite else {
        return Ok(());
    };
    if step.prerequisite_waived(amount) {
        return Ok(());
    }
    match chain_state.get(&prerequisite) {
        Some(Status::Validated) => Ok(()),
        _ => Err(TransitionError::PrerequisiteNotMet { step, prerequisite }),
    }
}
