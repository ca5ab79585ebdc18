use std::future::Future;

use chaine_core::{Action, Status};

use super::{make_audit, make_document, make_document_with_status, TestResult};
use crate::ChaineStorage;

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "snapshot",
            "uncommitted_write_invisible",
            uncommitted_write_invisible(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "abort_discards_writes",
            abort_discards_writes(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "read_for_update_sees_own_staged_write",
            read_for_update_sees_own_staged_write(factory).await,
        ),
    ]
}

async fn uncommitted_write_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
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
    if storage.get_document("eb-1").await.is_ok() {
        return Err("uncommitted create visible outside snapshot".to_string());
    }
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    storage
        .get_document("eb-1")
        .await
        .map_err(|e| format!("get after commit: {e}"))?;
    Ok(())
}

async fn abort_discards_writes<S, F, Fut>(factory: &F) -> Result<(), String>
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
        .abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;
    if storage.get_document("eb-1").await.is_ok() {
        return Err("aborted create still visible".to_string());
    }
    Ok(())
}

async fn read_for_update_sees_own_staged_write<S, F, Fut>(factory: &F) -> Result<(), String>
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
    storage
        .update_document(
            &mut snap,
            0,
            make_document_with_status("eb-1", Status::Submitted),
            make_audit("eb-1", Action::Submit),
        )
        .await
        .map_err(|e| format!("update: {e}"))?;
    let staged = storage
        .get_document_for_update(&mut snap, "eb-1")
        .await
        .map_err(|e| format!("read for update: {e}"))?;
    if staged.document.status != Status::Submitted {
        return Err(format!(
            "read-for-update did not see staged status, got {}",
            staged.document.status
        ));
    }
    // Outside the snapshot the old status still holds.
    let outside = storage
        .get_document("eb-1")
        .await
        .map_err(|e| format!("outside read: {e}"))?;
    if outside.document.status != Status::Draft {
        return Err("staged update leaked outside its snapshot".to_string());
    }
    Ok(())
}
