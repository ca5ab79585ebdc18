use std::future::Future;
use std::sync::Arc;

use chaine_core::{Action, Status};

use super::{make_audit, make_document, make_document_with_status, TestResult};
use crate::{ChaineStorage, StorageError};

/// Number of concurrent tasks spawned in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "concurrent_updates_exactly_one_wins",
            concurrent_updates_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "concurrent_updates_different_documents_all_succeed",
            concurrent_updates_different_documents_all_succeed(factory).await,
        ),
    ]
}

/// N tasks each open a snapshot and attempt to submit the same document
/// from version 0. Exactly one commit succeeds; every other task must
/// observe `ConcurrentConflict` at update or commit time.
async fn concurrent_updates_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    {
        let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
        storage
            .create_document(&mut snap, make_document("eb-1"))
            .await
            .map_err(|e| format!("create: {e}"))?;
        storage
            .commit_snapshot(snap)
            .await
            .map_err(|e| format!("commit init: {e}"))?;
    }

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            let staged = s
                .update_document(
                    &mut snap,
                    0,
                    make_document_with_status("eb-1", Status::Submitted),
                    make_audit("eb-1", Action::Submit),
                )
                .await;
            match staged {
                Ok(_) => s.commit_snapshot(snap).await,
                Err(e) => {
                    let _ = s.abort_snapshot(snap).await;
                    Err(e)
                }
            }
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.map_err(|e| format!("join: {e}"))? {
            Ok(()) => wins += 1,
            Err(StorageError::ConcurrentConflict { .. }) => conflicts += 1,
            Err(other) => return Err(format!("unexpected error: {other}")),
        }
    }
    if wins != 1 {
        return Err(format!("{wins} commits won, expected exactly 1"));
    }
    if conflicts != N - 1 {
        return Err(format!("{conflicts} conflicts, expected {}", N - 1));
    }
    let record = storage
        .get_document("eb-1")
        .await
        .map_err(|e| format!("final read: {e}"))?;
    if record.version != 1 {
        return Err(format!("final version {} != 1", record.version));
    }
    Ok(())
}

/// Tasks updating distinct documents never interfere.
async fn concurrent_updates_different_documents_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    {
        let mut snap = storage.begin_snapshot().await.map_err(|e| format!("begin: {e}"))?;
        for i in 0..N {
            storage
                .create_document(&mut snap, make_document(&format!("eb-{i}")))
                .await
                .map_err(|e| format!("create {i}: {e}"))?;
        }
        storage
            .commit_snapshot(snap)
            .await
            .map_err(|e| format!("commit init: {e}"))?;
    }

    let mut handles = Vec::new();
    for i in 0..N {
        let s = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let id = format!("eb-{i}");
            let mut snap = s.begin_snapshot().await?;
            s.update_document(
                &mut snap,
                0,
                make_document_with_status(&id, Status::Submitted),
                make_audit(&id, Action::Submit),
            )
            .await?;
            s.commit_snapshot(snap).await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("join: {e}"))?
            .map_err(|e| format!("task: {e}"))?;
    }
    for i in 0..N {
        let record = storage
            .get_document(&format!("eb-{i}"))
            .await
            .map_err(|e| format!("read {i}: {e}"))?;
        if record.document.status != Status::Submitted {
            return Err(format!("eb-{i} not submitted"));
        }
    }
    Ok(())
}
