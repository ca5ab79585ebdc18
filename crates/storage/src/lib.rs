//! chaine-storage: persistence seam for the workflow engine.
//!
//! The engine never talks to a database directly; it goes through the
//! [`ChaineStorage`] trait, which provides durable, transactional storage
//! for documents and their audit trail with optimistic concurrency on
//! every write. An in-memory backend ([`MemoryStorage`]) ships for tests
//! and the CLI; production backends implement the same trait and can
//! verify themselves against the [`conformance`] suite.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemoryState, MemoryStorage};
pub use record::DocumentRecord;
pub use traits::ChaineStorage;
