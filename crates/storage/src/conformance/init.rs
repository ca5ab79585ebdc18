use std::future::Future;

use super::{make_document, TestResult};
use crate::{ChaineStorage, StorageError};

pub(super) async fn run_init_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "init",
            "create_starts_at_version_zero",
            create_starts_at_version_zero(factory).await,
        ),
        TestResult::from_result(
            "init",
            "duplicate_create_rejected",
            duplicate_create_rejected(factory).await,
        ),
        TestResult::from_result(
            "init",
            "duplicate_create_in_same_snapshot_rejected",
            duplicate_create_in_same_snapshot_rejected(factory).await,
        ),
        TestResult::from_result(
            "init",
            "missing_document_not_found",
            missing_document_not_found(factory).await,
        ),
    ]
}

async fn create_starts_at_version_zero<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    storage
        .create_document(&mut snap, make_document("eb-1"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let record = storage
        .get_document("eb-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if record.version != 0 {
        return Err(format!("expected version 0, got {}", record.version));
    }
    Ok(())
}

async fn duplicate_create_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    storage
        .create_document(&mut snap, make_document("eb-1"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin 2: {e}"))?;
    match storage.create_document(&mut snap, make_document("eb-1")).await {
        Err(StorageError::AlreadyExists { entity_id }) if entity_id == "eb-1" => Ok(()),
        Err(other) => Err(format!("expected AlreadyExists, got {other}")),
        Ok(()) => {
            // Some backends defer the check to commit.
            match storage.commit_snapshot(snap).await {
                Err(StorageError::AlreadyExists { .. }) => Ok(()),
                Err(other) => Err(format!("expected AlreadyExists at commit, got {other}")),
                Ok(()) => Err("duplicate create succeeded".to_string()),
            }
        }
    }
}

async fn duplicate_create_in_same_snapshot_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    storage
        .create_document(&mut snap, make_document("eb-1"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    match storage.create_document(&mut snap, make_document("eb-1")).await {
        Err(StorageError::AlreadyExists { .. }) => Ok(()),
        Err(other) => Err(format!("expected AlreadyExists, got {other}")),
        Ok(()) => match storage.commit_snapshot(snap).await {
            Err(StorageError::AlreadyExists { .. }) => Ok(()),
            Err(other) => Err(format!("expected AlreadyExists at commit, got {other}")),
            Ok(()) => Err("duplicate create in one snapshot succeeded".to_string()),
        },
    }
}

async fn missing_document_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    match storage.get_document("absent").await {
        Err(StorageError::NotFound { entity_id }) if entity_id == "absent" => Ok(()),
        Err(other) => Err(format!("expected NotFound, got {other}")),
        Ok(_) => Err("read of absent document succeeded".to_string()),
    }
}
