use std::future::Future;

use chaine_core::{Action, Status};

use super::{make_audit, make_document, make_document_with_status, TestResult};
use crate::ChaineStorage;

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "commit",
            "multi_document_commit_is_atomic",
            multi_document_commit_is_atomic(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "failed_commit_applies_nothing",
            failed_commit_applies_nothing(factory).await,
        ),
    ]
}

async fn multi_document_commit_is_atomic<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = factory().await;
    let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
    for id in ["eb-1", "eb-2", "eb-3"] {
        storage
            .create_document(&mut snap, make_document(id))
            .await
            .map_err(|e| format!("create {id}: {e}"))?;
    }
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    for id in ["eb-1", "eb-2", "eb-3"] {
        storage
            .get_document(id)
            .await
            .map_err(|e| format!("get {id}: {e}"))?;
    }
    Ok(())
}

async fn failed_commit_applies_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
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

    // Stage a valid update in one snapshot, then have a rival commit
    // bump the version so the first snapshot's commit must fail.
    let mut stale = storage.begin_snapshot().await.map_err(|e| format!("begin stale: {e}"))?;
    storage
        .create_document(&mut stale, make_document("eb-2"))
        .await
        .map_err(|e| format!("stale create: {e}"))?;
    storage
        .update_document(
            &mut stale,
            0,
            make_document_with_status("eb-1", Status::Submitted),
            make_audit("eb-1", Action::Submit),
        )
        .await
        .map_err(|e| format!("stale update: {e}"))?;

    let mut rival = storage.begin_snapshot().await.map_err(|e| format!("begin rival: {e}"))?;
    storage
        .update_document(
            &mut rival,
            0,
            make_document_with_status("eb-1", Status::Submitted),
            make_audit("eb-1", Action::Submit),
        )
        .await
        .map_err(|e| format!("rival update: {e}"))?;
    storage
        .commit_snapshot(rival)
        .await
        .map_err(|e| format!("rival commit: {e}"))?;

    if storage.commit_snapshot(stale).await.is_ok() {
        return Err("stale commit succeeded".to_string());
    }
    // The stale snapshot's create must not have been applied either.
    if storage.get_document("eb-2").await.is_ok() {
        return Err("failed commit partially applied".to_string());
    }
    Ok(())
}
