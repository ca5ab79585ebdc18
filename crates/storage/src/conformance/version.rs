use std::future::Future;

use chaine_core::{Action, Status};

use super::{make_audit, make_document, make_document_with_status, TestResult};
use crate::{ChaineStorage, StorageError};

pub(super) async fn run_version_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "version",
            "update_increments_version",
            update_increments_version(factory).await,
        ),
        TestResult::from_result(
            "version",
            "wrong_version_returns_conflict",
            wrong_version_returns_conflict(factory).await,
        ),
        TestResult::from_result(
            "version",
            "stale_version_after_intervening_commit",
            stale_version_after_intervening_commit(factory).await,
        ),
        TestResult::from_result(
            "version",
            "conflict_carries_entity_and_version",
            conflict_carries_entity_and_version(factory).await,
        ),
        TestResult::from_result(
            "version",
            "delete_validates_version",
            delete_validates_version(factory).await,
        ),
    ]
}

async fn setup_committed<S>(storage: &S, id: &str) -> Result<(), String>
where
    S: ChaineStorage,
{
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    storage
        .create_document(&mut snap, make_document(id))
        .await
        .map_err(|e| format!("create: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))
}

async fn submit_at<S>(storage: &S, id: &str, expected_version: i64) -> Result<i64, StorageError>
where
    S: ChaineStorage,
{
    let mut snap = storage.begin_snapshot().await?;
    let new_version = storage
        .update_document(
            &mut snap,
            expected_version,
            make_document_with_status(id, Status::Submitted),
            make_audit(id, Action::Submit),
        )
        .await?;
    storage.commit_snapshot(snap).await?;
    Ok(new_version)
}

async fn update_increments_version<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    setup_committed(&storage, "eb-1").await?;
    let v1 = submit_at(&storage, "eb-1", 0)
        .await
        .map_err(|e| format!("update: {e}"))?;
    if v1 != 1 {
        return Err(format!("expected new version 1, got {v1}"));
    }
    let record = storage
        .get_document("eb-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if record.version != 1 {
        return Err(format!("stored version is {}, expected 1", record.version));
    }
    Ok(())
}

async fn wrong_version_returns_conflict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    setup_committed(&storage, "eb-1").await?;
    for wrong in [-1, 1, 7] {
        match submit_at(&storage, "eb-1", wrong).await {
            Err(StorageError::ConcurrentConflict { .. }) => {}
            Err(other) => return Err(format!("version {wrong}: expected conflict, got {other}")),
            Ok(_) => return Err(format!("version {wrong}: update succeeded")),
        }
    }
    Ok(())
}

async fn stale_version_after_intervening_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    setup_committed(&storage, "eb-1").await?;
    submit_at(&storage, "eb-1", 0)
        .await
        .map_err(|e| format!("first update: {e}"))?;
    // Version is now 1; an update still expecting 0 must conflict.
    match submit_at(&storage, "eb-1", 0).await {
        Err(StorageError::ConcurrentConflict { .. }) => Ok(()),
        Err(other) => Err(format!("expected conflict, got {other}")),
        Ok(_) => Err("stale update succeeded".to_string()),
    }
}

async fn conflict_carries_entity_and_version<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    setup_committed(&storage, "eb-1").await?;
    match submit_at(&storage, "eb-1", 5).await {
        Err(StorageError::ConcurrentConflict {
            entity_id,
            expected_version,
        }) => {
            if entity_id != "eb-1" {
                return Err(format!("conflict names entity {entity_id}"));
            }
            if expected_version != 5 {
                return Err(format!("conflict names version {expected_version}"));
            }
            Ok(())
        }
        Err(other) => Err(format!("expected conflict, got {other}")),
        Ok(_) => Err("update succeeded".to_string()),
    }
}

async fn delete_validates_version<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    setup_committed(&storage, "eb-1").await?;
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    match storage
        .delete_document(&mut snap, "eb-1", 3, make_audit("eb-1", Action::Delete))
        .await
    {
        Err(StorageError::ConcurrentConflict { .. }) => {}
        Err(other) => return Err(format!("expected conflict, got {other}")),
        Ok(()) => {
            if storage.commit_snapshot(snap).await.is_ok() {
                return Err("delete with wrong version succeeded".to_string());
            }
            return Ok(());
        }
    }
    let _ = storage.abort_snapshot(snap).await;

    // Correct version deletes cleanly.
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin 2: {e}"))?;
    storage
        .delete_document(&mut snap, "eb-1", 0, make_audit("eb-1", Action::Delete))
        .await
        .map_err(|e| format!("delete: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    if storage.get_document("eb-1").await.is_ok() {
        return Err("document still present after delete".to_string());
    }
    Ok(())
}
