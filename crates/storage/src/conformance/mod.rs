//! Conformance test suite for `ChaineStorage` implementations.
//!
//! A backend-agnostic suite any `ChaineStorage` implementation can run
//! to verify correctness:
//!
//! - **Init**: document creation, duplicate detection
//! - **Snapshot isolation**: uncommitted writes invisible, aborts discard
//! - **Atomic commit**: all-or-nothing semantics for multi-op snapshots
//! - **Version validation / OCC**: conflict detection on stale versions
//! - **Audit coupling**: audit entries land with the writes they describe
//! - **Concurrency**: racing writers, exactly one wins
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that
//! creates a fresh, empty storage instance per test:
//!
//! ```ignore
//! use chaine_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod audit;
mod commit;
mod concurrent;
mod init;
mod snapshot;
mod version;

use std::fmt;
use std::future::Future;

use chaine_core::{Action, AuditEntry, Document, Status, Step};
use rust_decimal::Decimal;

use crate::ChaineStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "init", "version").
    pub category: String,
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: true,
                message: None,
            },
            Err(msg) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: false,
                message: Some(msg),
            },
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// `factory` is called once per test to create a fresh, empty storage
/// instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ChaineStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(init::run_init_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(version::run_version_tests(&factory).await);
    results.extend(audit::run_audit_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with fixed timestamps ───────────────────────

fn make_document(id: &str) -> Document {
    let mut doc = Document::draft(
        id,
        Step::ExpressionBesoin,
        Decimal::from(140_000),
        "BL-6011",
        "user-agent",
        2026,
    );
    doc.created_at = "2026-01-01T00:00:00Z".to_string();
    doc
}

fn make_document_with_status(id: &str, status: Status) -> Document {
    let mut doc = make_document(id);
    doc.status = status;
    doc
}

fn make_audit(entity_id: &str, action: Action) -> AuditEntry {
    AuditEntry::new(
        format!("audit-{}-{}", entity_id, action.as_str()),
        entity_id,
        "user-agent",
        action,
        "2026-01-01T00:00:00Z",
        None,
        None,
    )
}
