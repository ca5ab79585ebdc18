//! chaine-engine: the validation workflow engine of the expenditure chain.
//!
//! The engine owns one decision: is a requested status transition
//! admissible, and if so, what does the document look like afterwards.
//! It validates the transition against an explicit table, checks the
//! actor's capability at the document's step, evaluates the guards
//! (motif length, budget sufficiency), and applies the result through
//! the storage seam atomically with its audit entry.
//!
//! Collaborators are consumed through narrow traits and never
//! reimplemented here:
//!
//! - [`ChaineStorage`](chaine_storage::ChaineStorage) -- persistence with
//!   OCC; the engine fails on `Conflict` rather than overwrite
//! - [`BudgetLedger`] -- read-only availability lookups, consulted on
//!   submit
//! - [`NotificationSink`] -- best-effort, informed of terminal outcomes
//!
//! The guard logic itself is synchronous and pure; only the storage
//! round-trip is async.

mod action_space;
mod engine;
mod error;
mod guard;
mod ledger;
mod notify;
mod transition;

pub use action_space::available_actions;
pub use engine::{TransitionOutcome, WorkflowEngine};
pub use error::TransitionError;
pub use guard::{check_prerequisites, Payload};
pub use ledger::{BudgetLedger, BudgetLineAvailability, LedgerError, TableLedger};
pub use notify::{EventKind, NoopSink, NotificationSink, RecordingSink};
pub use transition::{
    actor_may, required_capability, resolve_target, rule_for, CapabilityReq, Target,
    TransitionRule, TRANSITIONS,
};
