//! Workflow statuses and transition actions.
//!
//! Statuses serialize to the French wire strings the production database
//! persists (`brouillon`, `soumis`, ...). The enum is closed: anything
//! outside this set is a data error, not a new status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status of a chain document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Being edited by its creator; not yet in the validation circuit.
    #[serde(rename = "brouillon")]
    Draft,
    /// Submitted into the validation circuit; reference assigned.
    #[serde(rename = "soumis")]
    Submitted,
    /// Passed first-level verification, awaiting final validation.
    /// Only reachable on two-stage workflows.
    #[serde(rename = "a_valider")]
    Verified,
    /// Validated. Terminal and locked against edit, submit and delete.
    #[serde(rename = "valide")]
    Validated,
    /// Rejected with a mandatory motif. Terminal.
    #[serde(rename = "rejete")]
    Rejected,
    /// Paused by a verifier or validator; resumable back to `soumis`.
    #[serde(rename = "differe")]
    Deferred,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "brouillon",
            Status::Submitted => "soumis",
            Status::Verified => "a_valider",
            Status::Validated => "valide",
            Status::Rejected => "rejete",
            Status::Deferred => "differe",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "brouillon" => Some(Status::Draft),
            "soumis" => Some(Status::Submitted),
            "a_valider" => Some(Status::Verified),
            "valide" => Some(Status::Validated),
            "rejete" => Some(Status::Rejected),
            "differe" => Some(Status::Deferred),
            _ => None,
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Validated | Status::Rejected)
    }

    /// A validated document is locked: no edit, no re-submit, no delete.
    pub fn is_locked(&self) -> bool {
        matches!(self, Status::Validated)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested workflow transition.
///
/// Serialized uppercase, matching the audit-trail action vocabulary of
/// the production system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Document creation. Recorded in the audit trail but not a workflow
    /// transition: no status admits it, so the engine refuses it.
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "SUBMIT")]
    Submit,
    #[serde(rename = "VERIFY")]
    Verify,
    #[serde(rename = "VALIDATE")]
    Validate,
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "DEFER")]
    Defer,
    #[serde(rename = "RESUME")]
    Resume,
    #[serde(rename = "DELETE")]
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Submit => "SUBMIT",
            Action::Verify => "VERIFY",
            Action::Validate => "VALIDATE",
            Action::Reject => "REJECT",
            Action::Defer => "DEFER",
            Action::Resume => "RESUME",
            Action::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Some(Action::Create),
            "SUBMIT" => Some(Action::Submit),
            "VERIFY" => Some(Action::Verify),
            "VALIDATE" => Some(Action::Validate),
            "REJECT" => Some(Action::Reject),
            "DEFER" => Some(Action::Defer),
            "RESUME" => Some(Action::Resume),
            "DELETE" => Some(Action::Delete),
            _ => None,
        }
    }

    /// Negative outcomes require a motif of at least [`MIN_REASON_LEN`]
    /// characters.
    pub fn requires_reason(&self) -> bool {
        matches!(self, Action::Reject | Action::Defer)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum motif length for reject/defer and for budget overrides.
pub const MIN_REASON_LEN: usize = 10;
