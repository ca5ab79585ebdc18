/// All errors a `ChaineStorage` implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Optimistic concurrency conflict — another transaction modified
    /// the document concurrently. The expected version was not found.
    #[error("concurrent conflict on document {entity_id}: expected version {expected_version}")]
    ConcurrentConflict {
        entity_id: String,
        expected_version: i64,
    },

    /// No document with this id — or none visible to the caller, which
    /// row-level authorization makes indistinguishable from absence.
    #[error("document not found: {entity_id}")]
    NotFound { entity_id: String },

    /// A document with this id already exists.
    #[error("document already exists: {entity_id}")]
    AlreadyExists { entity_id: String },

    /// A backend-specific storage error (connection, serialization, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}
