//! Typed transition errors.
//!
//! Every guard failure is reported synchronously as one of these
//! variants; nothing is retried and no opaque error crosses the engine
//! boundary. The caller maps each kind to its own user-facing message.

use rust_decimal::Decimal;
use std::fmt;

use chaine_core::{Action, Status, Step};
use chaine_storage::StorageError;

/// Why a requested transition was refused (or failed to apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The action is not valid from the document's current status.
    IllegalTransition { from: Status, action: Action },
    /// The actor lacks the capability the transition requires.
    Unauthorized {
        actor_id: String,
        action: Action,
        step: Step,
    },
    /// Reject/defer (or a budget override) without a motif of at least
    /// 10 characters.
    MissingReason { action: Action },
    /// Submitted amount exceeds the budget line's availability and no
    /// valid override was supplied.
    BudgetInsufficient {
        budget_line_id: String,
        requested: Decimal,
        available: Decimal,
    },
    /// The document carries a negative amount.
    NegativeAmount { entity_id: String, amount: Decimal },
    /// The draft has no valid line to submit.
    NoValidLines { entity_id: String },
    /// The preceding chain step has not been validated.
    PrerequisiteNotMet { step: Step, prerequisite: Step },
    /// Document absent, or invisible to the actor under row-level
    /// authorization (indistinguishable by design).
    NotFound { entity_id: String },
    /// A concurrent writer changed the document between read and write.
    /// The caller may re-read and re-attempt; the engine never does.
    Conflict { entity_id: String },
    /// The budget ledger could not answer for this line.
    UnknownBudgetLine { budget_line_id: String },
    /// Backend failure below the storage trait.
    Storage { message: String },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::IllegalTransition { from, action } => {
                write!(f, "action {} is not allowed from status {}", action, from)
            }
            TransitionError::Unauthorized {
                actor_id,
                action,
                step,
            } => {
                write!(
                    f,
                    "actor {} is not authorized to {} at step {}",
                    actor_id, action, step
                )
            }
            TransitionError::MissingReason { action } => {
                write!(f, "{} requires a motif of at least 10 characters", action)
            }
            TransitionError::BudgetInsufficient {
                budget_line_id,
                requested,
                available,
            } => {
                write!(
                    f,
                    "insufficient budget on line {}: requested {}, available {}",
                    budget_line_id, requested, available
                )
            }
            TransitionError::NegativeAmount { entity_id, amount } => {
                write!(f, "document {} has a negative amount: {}", entity_id, amount)
            }
            TransitionError::NoValidLines { entity_id } => {
                write!(f, "document {} has no valid line to submit", entity_id)
            }
            TransitionError::PrerequisiteNotMet { step, prerequisite } => {
                write!(
                    f,
                    "step {} requires a validated {} first",
                    step, prerequisite
                )
            }
            TransitionError::NotFound { entity_id } => {
                write!(f, "document not found: {}", entity_id)
            }
            TransitionError::Conflict { entity_id } => {
                write!(f, "concurrent modification of document {}", entity_id)
            }
            TransitionError::UnknownBudgetLine { budget_line_id } => {
                write!(f, "unknown budget line: {}", budget_line_id)
            }
            TransitionError::Storage { message } => {
                write!(f, "storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

impl From<StorageError> for TransitionError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { entity_id } => TransitionError::NotFound { entity_id },
            StorageError::ConcurrentConflict { entity_id, .. } => {
                TransitionError::Conflict { entity_id }
            }
            StorageError::AlreadyExists { entity_id } => TransitionError::Storage {
                message: format!("document already exists: {}", entity_id),
            },
            StorageError::Backend(message) => TransitionError::Storage { message },
        }
    }
}
