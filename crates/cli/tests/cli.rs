//! CLI integration tests: spawn the `chaine` binary against a
//! temporary JSON store and verify exit codes, stdout, and stderr.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn chaine(store: &std::path::Path) -> Command {
    let mut cmd = cargo_bin_cmd!("chaine");
    cmd.arg("--store").arg(store);
    cmd
}

fn store_in(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("chaine.json")
}

fn set_budget(store: &std::path::Path, code: &str, allocation: &str) {
    chaine(store)
        .args(["budget", "set", code, "--allocation", allocation])
        .assert()
        .success();
}

fn create_note(store: &std::path::Path, id: &str, amount: &str) {
    chaine(store)
        .args([
            "create",
            id,
            "--step",
            "NOTE_SEF",
            "--amount",
            amount,
            "--budget-line",
            "BL-01",
            "--exercice",
            "2026",
            "--line",
        ])
        .arg(format!("Mission de supervision={}", amount))
        .args(["--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success();
}

#[test]
fn help_exits_0_with_description() {
    cargo_bin_cmd!("chaine")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expenditure chain workflow CLI"));
}

#[test]
fn version_exits_0() {
    cargo_bin_cmd!("chaine")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chaine"));
}

#[test]
fn full_circuit_on_a_single_stage_step() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");

    // First submission assigns the reference.
    chaine(&store)
        .args(["submit", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ARTI/2026/SEF/0001"));

    // NOTE_SEF has a single validation stage: DG verification validates.
    chaine(&store)
        .args(["verify", "note-1", "--actor", "u-dg", "--role", "DG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valide"));

    chaine(&store)
        .args(["show", "note-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valide"));

    chaine(&store)
        .args(["audit", "note-1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("CREATE")
                .and(predicate::str::contains("SUBMIT"))
                .and(predicate::str::contains("VERIFY")),
        );
}

#[test]
fn over_budget_submit_fails_and_leaves_the_draft() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "220000");

    chaine(&store)
        .args(["submit", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("insufficient budget on line BL-01"));

    chaine(&store)
        .args(["show", "note-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("brouillon"));
}

#[test]
fn negative_amount_is_refused_at_creation() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");

    chaine(&store)
        .args(["create", "note-neg", "--step", "NOTE_SEF"])
        .arg("--amount=-5000")
        .args(["--budget-line", "BL-01", "--exercice", "2026", "--line"])
        .arg("Mission de supervision=-5000")
        .args(["--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("has a negative amount"));

    chaine(&store)
        .args(["show", "note-neg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("document not found"));
}

#[test]
fn reject_insists_on_a_substantive_motif() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");
    chaine(&store)
        .args(["submit", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success();

    chaine(&store)
        .args([
            "reject", "note-1", "--motif", "court", "--actor", "u-dg", "--role", "DG",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("motif of at least 10 characters"));

    chaine(&store)
        .args([
            "reject",
            "note-1",
            "--motif",
            "Dossier incomplet, pièces justificatives manquantes",
            "--actor",
            "u-dg",
            "--role",
            "DG",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("rejete"));
}

#[test]
fn verify_without_the_role_is_refused() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");
    chaine(&store)
        .args(["submit", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success();

    chaine(&store)
        .args(["verify", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not authorized"));
}

#[test]
fn chain_order_is_enforced_at_creation() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");

    // Expression de besoin needs a validated imputation on the line.
    chaine(&store)
        .args([
            "create",
            "eb-1",
            "--step",
            "EB",
            "--amount",
            "100000",
            "--budget-line",
            "BL-01",
            "--exercice",
            "2026",
            "--actor",
            "u-agent",
            "--role",
            "AGENT",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires a validated"));
}

#[test]
fn defer_and_resume_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");
    chaine(&store)
        .args(["submit", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success();

    chaine(&store)
        .args([
            "defer",
            "note-1",
            "--motif",
            "En attente de la ligne de crédit",
            "--resume-date",
            "2026-09-15",
            "--actor",
            "u-dg",
            "--role",
            "DG",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("differe"));

    chaine(&store)
        .args(["resume", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("soumis"));
}

#[test]
fn json_output_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");

    let assert = chaine(&store)
        .args([
            "submit", "note-1", "--actor", "u-agent", "--role", "AGENT", "--output", "json",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["status"], "soumis");
    assert_eq!(value["reference"], "ARTI/2026/SEF/0001");

    // Refusals are JSON on stderr too.
    let assert = chaine(&store)
        .args([
            "verify", "note-1", "--actor", "u-agent", "--role", "AGENT", "--output", "json",
        ])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stderr).unwrap();
    assert!(value["error"].as_str().unwrap().contains("not authorized"));
}

#[test]
fn actions_lists_what_the_actor_may_do() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    set_budget(&store, "BL-01", "200000");
    create_note(&store, "note-1", "140000");

    chaine(&store)
        .args(["actions", "note-1", "--actor", "u-agent", "--role", "AGENT"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("SUBMIT").and(predicate::str::contains("DELETE")),
        );

    // The DG holds no action on someone else's draft.
    chaine(&store)
        .args(["actions", "note-1", "--actor", "u-dg", "--role", "DG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no available actions"));
}

#[test]
fn unknown_document_exits_1() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    chaine(&store)
        .args(["show", "missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("document not found"));
}

#[test]
fn budget_list_reports_availability() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    chaine(&store)
        .args([
            "budget",
            "set",
            "BL-01",
            "--allocation",
            "1000000",
            "--committed",
            "400000",
            "--reserved",
            "100000",
        ])
        .assert()
        .success();

    chaine(&store)
        .args(["budget", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("available 500000"));
}
