use async_trait::async_trait;

use chaine_core::{AuditEntry, Document};

use crate::error::StorageError;
use crate::record::DocumentRecord;

/// The storage trait for workflow execution backends.
///
/// A `ChaineStorage` implementation provides durable, transactional
/// storage for chain documents, their audit trail, and the reference
/// sequences.
///
/// ## Snapshot semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type
/// representing an in-progress transaction:
///
/// 1. `begin_snapshot()` — start a transaction
/// 2. call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` — commit and consume
///    OR `abort_snapshot(snapshot)` — roll back and consume
///
/// A dropped, uncommitted `Snapshot` must roll back.
///
/// ## OCC conflict detection
///
/// `update_document` and `delete_document` are conditional on
/// `version = expected_version`; a mismatch returns
/// `Err(StorageError::ConcurrentConflict)`. The engine treats that as a
/// signal to fail the transition, never to overwrite.
///
/// ## Audit coupling
///
/// Writes that change workflow state take the matching [`AuditEntry`]
/// and persist it in the same transaction: no state change without its
/// audit record.
#[async_trait]
pub trait ChaineStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ──────────────────────────────────────────────

    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Documents ───────────────────────────────────────────────────────

    /// Create a new document at version 0.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` on a duplicate id.
    async fn create_document(
        &self,
        snapshot: &mut Self::Snapshot,
        document: Document,
    ) -> Result<(), StorageError>;

    /// Read a document without locking (outside any snapshot).
    async fn get_document(&self, id: &str) -> Result<DocumentRecord, StorageError>;

    /// Read a document within a snapshot, locking it for update
    /// (`SELECT ... FOR UPDATE` semantics on SQL backends).
    async fn get_document_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        id: &str,
    ) -> Result<DocumentRecord, StorageError>;

    /// Apply a version-validated update plus its audit entry (OCC).
    ///
    /// Returns the new version on success.
    async fn update_document(
        &self,
        snapshot: &mut Self::Snapshot,
        expected_version: i64,
        document: Document,
        audit: AuditEntry,
    ) -> Result<i64, StorageError>;

    /// Remove a document, version-validated, with its audit entry.
    /// Only drafts are ever deleted; the engine enforces that.
    async fn delete_document(
        &self,
        snapshot: &mut Self::Snapshot,
        id: &str,
        expected_version: i64,
        audit: AuditEntry,
    ) -> Result<(), StorageError>;

    /// List every stored document (reporting/CLI use).
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StorageError>;

    // ── Audit trail ─────────────────────────────────────────────────────

    /// Append an audit entry not tied to a state change (e.g. CREATE).
    async fn append_audit(
        &self,
        snapshot: &mut Self::Snapshot,
        entry: AuditEntry,
    ) -> Result<(), StorageError>;

    /// The full audit trail of one document, in append order.
    async fn audit_trail(&self, entity_id: &str) -> Result<Vec<AuditEntry>, StorageError>;

    // ── Reference sequences ─────────────────────────────────────────────

    /// Allocate the next reference sequence number for (exercice, step
    /// code). Monotonic per key; allocated outside snapshots, so an
    /// aborted submission may leave a gap — references must be unique,
    /// not dense.
    async fn next_sequence(&self, exercice: i32, code: &str) -> Result<u64, StorageError>;
}
