use std::future::Future;

use chaine_core::{Action, Status};

use super::{make_audit, make_document, make_document_with_status, TestResult};
use crate::ChaineStorage;

pub(super) async fn run_audit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "audit",
            "update_couples_audit_entry",
            update_couples_audit_entry(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "aborted_snapshot_writes_no_audit",
            aborted_snapshot_writes_no_audit(factory).await,
        ),
        TestResult::from_result(
            "audit",
            "trail_preserves_append_order",
            trail_preserves_append_order(factory).await,
        ),
    ]
}

async fn update_couples_audit_entry<S, F, Fut>(factory: &F) -> Result<(), String>
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
        .update_document(
            &mut snap,
            0,
            make_document_with_status("eb-1", Status::Submitted),
            make_audit("eb-1", Action::Submit),
        )
        .await
        .map_err(|e| format!("update: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let trail = storage
        .audit_trail("eb-1")
        .await
        .map_err(|e| format!("trail: {e}"))?;
    if trail.len() != 1 {
        return Err(format!("expected 1 audit entry, got {}", trail.len()));
    }
    if trail[0].action != Action::Submit {
        return Err(format!("expected SUBMIT entry, got {}", trail[0].action));
    }
    Ok(())
}

async fn aborted_snapshot_writes_no_audit<S, F, Fut>(factory: &F) -> Result<(), String>
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
    storage
        .abort_snapshot(snap)
        .await
        .map_err(|e| format!("abort: {e}"))?;

    let trail = storage
        .audit_trail("eb-1")
        .await
        .map_err(|e| format!("trail: {e}"))?;
    if !trail.is_empty() {
        return Err(format!(
            "aborted snapshot left {} audit entries",
            trail.len()
        ));
    }
    Ok(())
}

async fn trail_preserves_append_order<S, F, Fut>(factory: &F) -> Result<(), String>
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
        .append_audit(&mut snap, make_audit("eb-1", Action::Submit))
        .await
        .map_err(|e| format!("audit 1: {e}"))?;
    storage
        .append_audit(&mut snap, make_audit("eb-1", Action::Verify))
        .await
        .map_err(|e| format!("audit 2: {e}"))?;
    storage
        .append_audit(&mut snap, make_audit("eb-1", Action::Validate))
        .await
        .map_err(|e| format!("audit 3: {e}"))?;
    storage
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;

    let trail = storage
        .audit_trail("eb-1")
        .await
        .map_err(|e| format!("trail: {e}"))?;
    let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
    if actions != vec![Action::Submit, Action::Verify, Action::Validate] {
        return Err(format!("out-of-order trail: {actions:?}"));
    }
    Ok(())
}
