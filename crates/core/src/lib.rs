//! chaine-core: domain model for the expenditure chain.
//!
//! The chain (chaîne de la dépense) runs through nine document steps,
//! from the initial requirement note to final settlement. Every document
//! carries a workflow status and moves along role-gated transitions; this
//! crate holds the vocabulary those transitions are expressed in:
//!
//! - [`Status`] / [`Action`] -- the closed status set and the actions
//!   that move between statuses
//! - [`Step`] -- the nine chain steps with their static configuration
//!   (verifier/validator roles, prerequisites, thresholds)
//! - [`Role`] / [`Capability`] -- the role taxonomy and the pure
//!   capability check that gates transitions
//! - [`Document`] -- the workflow-bearing record
//! - [`AuditEntry`] -- the immutable trail record appended on every
//!   accepted transition
//!
//! No storage, no I/O: everything here is pure data and pure functions.

pub mod audit;
pub mod document;
pub mod role;
pub mod status;
pub mod step;

pub use audit::AuditEntry;
pub use document::{format_reference, Document, LineItem};
pub use role::{actor_has_capability, Actor, Capability, Role};
pub use status::{Action, Status, MIN_REASON_LEN};
pub use step::{OverridePolicy, Step, StepConfig};

/// Current UTC instant as an RFC 3339 string, second precision.
///
/// Records store timestamps as strings, matching what the production
/// database persists.
pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
