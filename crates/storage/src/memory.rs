//! In-memory `ChaineStorage` backend.
//!
//! Snapshots stage their mutations as an op log; nothing touches the
//! committed state until `commit_snapshot`, which replays the log
//! atomically under the lock (all-or-nothing). Version checks run both
//! at call time, against the committed state overlaid with the
//! snapshot's own staged ops, and again at commit, so a snapshot racing
//! a committed writer still fails with `ConcurrentConflict` instead of
//! overwriting.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chaine_core::{AuditEntry, Document};

use crate::error::StorageError;
use crate::record::DocumentRecord;
use crate::traits::ChaineStorage;

/// Serializable snapshot of the whole store. Used by the CLI to persist
/// the store as a JSON file between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryState {
    pub documents: BTreeMap<String, DocumentRecord>,
    pub audit: Vec<AuditEntry>,
    pub sequences: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
enum Op {
    Create(Document),
    Update {
        expected_version: i64,
        document: Document,
        audit: AuditEntry,
    },
    Delete {
        id: String,
        expected_version: i64,
        audit: AuditEntry,
    },
    Audit(AuditEntry),
}

/// An in-progress transaction: an op log replayed on commit.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    ops: Vec<Op>,
}

/// In-memory storage backend.
pub struct MemoryStorage {
    inner: Mutex<MemoryState>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            inner: Mutex::new(MemoryState::default()),
        }
    }

    /// Restore a store previously exported with [`export_state`](Self::export_state).
    pub fn from_state(state: MemoryState) -> Self {
        MemoryStorage {
            inner: Mutex::new(state),
        }
    }

    pub fn export_state(&self) -> Result<MemoryState, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_string()))
    }
}

/// Replay `ops` over a clone of `base`. Fails on the first violated
/// precondition without touching `base`.
fn replay(base: &MemoryState, ops: &[Op]) -> Result<MemoryState, StorageError> {
    let mut state = base.clone();
    for op in ops {
        match op {
            Op::Create(document) => {
                if state.documents.contains_key(&document.id) {
                    return Err(StorageError::AlreadyExists {
                        entity_id: document.id.clone(),
                    });
                }
                state
                    .documents
                    .insert(document.id.clone(), DocumentRecord::new(document.clone()));
            }
            Op::Update {
                expected_version,
                document,
                audit,
            } => {
                let record =
                    state
                        .documents
                        .get_mut(&document.id)
                        .ok_or_else(|| StorageError::NotFound {
                            entity_id: document.id.clone(),
                        })?;
                if record.version != *expected_version {
                    return Err(StorageError::ConcurrentConflict {
                        entity_id: document.id.clone(),
                        expected_version: *expected_version,
                    });
                }
                record.document = document.clone();
                record.version += 1;
                state.audit.push(audit.clone());
            }
            Op::Delete {
                id,
                expected_version,
                audit,
            } => {
                let record = state
                    .documents
                    .get(id)
                    .ok_or_else(|| StorageError::NotFound {
                        entity_id: id.clone(),
                    })?;
                if record.version != *expected_version {
                    return Err(StorageError::ConcurrentConflict {
                        entity_id: id.clone(),
                        expected_version: *expected_version,
                    });
                }
                state.documents.remove(id);
                state.audit.push(audit.clone());
            }
            Op::Audit(entry) => {
                state.audit.push(entry.clone());
            }
        }
    }
    Ok(state)
}

#[async_trait]
impl ChaineStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot::default())
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let mut committed = self.lock()?;
        let next = replay(&committed, &snapshot.ops)?;
        *committed = next;
        Ok(())
    }

    async fn abort_snapshot(&self, _snapshot: MemorySnapshot) -> Result<(), StorageError> {
        // The op log is simply dropped.
        Ok(())
    }

    async fn create_document(
        &self,
        snapshot: &mut MemorySnapshot,
        document: Document,
    ) -> Result<(), StorageError> {
        let committed = self.lock()?;
        let mut staged = snapshot.ops.clone();
        staged.push(Op::Create(document.clone()));
        replay(&committed, &staged)?;
        drop(committed);
        snapshot.ops.push(Op::Create(document));
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<DocumentRecord, StorageError> {
        self.lock()?
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                entity_id: id.to_string(),
            })
    }

    async fn get_document_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        id: &str,
    ) -> Result<DocumentRecord, StorageError> {
        let committed = self.lock()?;
        let view = replay(&committed, &snapshot.ops)?;
        view.documents
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                entity_id: id.to_string(),
            })
    }

    async fn update_document(
        &self,
        snapshot: &mut MemorySnapshot,
        expected_version: i64,
        document: Document,
        audit: AuditEntry,
    ) -> Result<i64, StorageError> {
        let op = Op::Update {
            expected_version,
            document,
            audit,
        };
        let committed = self.lock()?;
        let mut staged = snapshot.ops.clone();
        staged.push(op.clone());
        let view = replay(&committed, &staged)?;
        drop(committed);
        let new_version = match &op {
            Op::Update { document, .. } => {
                view.documents
                    .get(&document.id)
                    .map(|r| r.version)
                    .unwrap_or(expected_version + 1)
            }
            _ => expected_version + 1,
        };
        snapshot.ops.push(op);
        Ok(new_version)
    }

    async fn delete_document(
        &self,
        snapshot: &mut MemorySnapshot,
        id: &str,
        expected_version: i64,
        audit: AuditEntry,
    ) -> Result<(), StorageError> {
        let op = Op::Delete {
            id: id.to_string(),
            expected_version,
            audit,
        };
        let committed = self.lock()?;
        let mut staged = snapshot.ops.clone();
        staged.push(op.clone());
        replay(&committed, &staged)?;
        drop(committed);
        snapshot.ops.push(op);
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        Ok(self.lock()?.documents.values().cloned().collect())
    }

    async fn append_audit(
        &self,
        snapshot: &mut MemorySnapshot,
        entry: AuditEntry,
    ) -> Result<(), StorageError> {
        snapshot.ops.push(Op::Audit(entry));
        Ok(())
    }

    async fn audit_trail(&self, entity_id: &str) -> Result<Vec<AuditEntry>, StorageError> {
        Ok(self
            .lock()?
            .audit
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn next_sequence(&self, exercice: i32, code: &str) -> Result<u64, StorageError> {
        let mut committed = self.lock()?;
        let key = format!("{}:{}", exercice, code);
        let counter = committed.sequences.entry(key).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaine_core::{Action, Status, Step};
    use rust_decimal::Decimal;

    fn doc(id: &str) -> Document {
        let mut d = Document::draft(id, Step::ExpressionBesoin, Decimal::from(1000), "BL-01", "u-1", 2026);
        d.created_at = "2026-01-01T00:00:00Z".to_string();
        d
    }

    fn audit(entity: &str, action: Action) -> AuditEntry {
        AuditEntry::new(
            format!("a-{}", entity),
            entity,
            "u-1",
            action,
            "2026-01-01T00:00:00Z",
            None,
            None,
        )
    }

    #[tokio::test]
    async fn create_commit_read() {
        let storage = MemoryStorage::new();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage.create_document(&mut snap, doc("eb-1")).await.unwrap();
        // Invisible before commit.
        assert!(matches!(
            storage.get_document("eb-1").await,
            Err(StorageError::NotFound { .. })
        ));
        storage.commit_snapshot(snap).await.unwrap();
        let record = storage.get_document("eb-1").await.unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.document.status, Status::Draft);
    }

    #[tokio::test]
    async fn aborted_snapshot_leaves_no_trace() {
        let storage = MemoryStorage::new();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage.create_document(&mut snap, doc("eb-1")).await.unwrap();
        storage.abort_snapshot(snap).await.unwrap();
        assert!(storage.get_document("eb-1").await.is_err());
    }

    #[tokio::test]
    async fn stale_version_conflicts_at_update() {
        let storage = MemoryStorage::new();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage.create_document(&mut snap, doc("eb-1")).await.unwrap();
        storage.commit_snapshot(snap).await.unwrap();

        let mut snap = storage.begin_snapshot().await.unwrap();
        let mut updated = doc("eb-1");
        updated.status = Status::Submitted;
        let err = storage
            .update_document(&mut snap, 7, updated, audit("eb-1", Action::Submit))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConcurrentConflict { expected_version: 7, .. }));
    }

    #[tokio::test]
    async fn racing_snapshot_conflicts_at_commit() {
        let storage = MemoryStorage::new();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage.create_document(&mut snap, doc("eb-1")).await.unwrap();
        storage.commit_snapshot(snap).await.unwrap();

        // Two snapshots both stage an update from version 0.
        let mut first = storage.begin_snapshot().await.unwrap();
        let mut second = storage.begin_snapshot().await.unwrap();
        let mut updated = doc("eb-1");
        updated.status = Status::Submitted;
        storage
            .update_document(&mut first, 0, updated.clone(), audit("eb-1", Action::Submit))
            .await
            .unwrap();
        storage
            .update_document(&mut second, 0, updated, audit("eb-1", Action::Submit))
            .await
            .unwrap();

        storage.commit_snapshot(first).await.unwrap();
        let err = storage.commit_snapshot(second).await.unwrap_err();
        assert!(matches!(err, StorageError::ConcurrentConflict { .. }));
        assert_eq!(storage.get_document("eb-1").await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn sequences_are_monotonic_per_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.next_sequence(2026, "EB").await.unwrap(), 1);
        assert_eq!(storage.next_sequence(2026, "EB").await.unwrap(), 2);
        assert_eq!(storage.next_sequence(2026, "SEF").await.unwrap(), 1);
        assert_eq!(storage.next_sequence(2025, "EB").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn export_and_restore_round_trip() {
        let storage = MemoryStorage::new();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage.create_document(&mut snap, doc("eb-1")).await.unwrap();
        storage
            .append_audit(&mut snap, audit("eb-1", Action::Submit))
            .await
            .unwrap();
        storage.commit_snapshot(snap).await.unwrap();

        let state = storage.export_state().unwrap();
        let restored = MemoryStorage::from_state(state);
        assert!(restored.get_document("eb-1").await.is_ok());
        assert_eq!(restored.audit_trail("eb-1").await.unwrap().len(), 1);
    }
}
