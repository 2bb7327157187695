use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

fn roomkey() -> Command {
    Command::cargo_bin("roomkey").unwrap()
}

#[test]
fn test_version_prints() {
    roomkey()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("roomkey "));
}

#[test]
fn test_key_is_deterministic_and_order_independent() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    write(&a, r#"{"cabinet-color":"oak","backsplash":"subway-white"}"#);
    write(&b, r#"{"backsplash":"subway-white","cabinet-color":"oak"}"#);

    let run = |file: &Path| {
        let out = roomkey()
            .args(["key", "--photo-id", "kitchen-close", "--selections"])
            .arg(file)
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };

    let key_a = run(&a);
    let key_b = run(&b);
    assert_eq!(key_a, key_b);
    assert_eq!(key_a, run(&a));
    assert_eq!(key_a.trim().len(), 64);
}

#[test]
fn test_photo_hash_switches_to_anchored_key() {
    let dir = tempfile::tempdir().unwrap();
    let sel = dir.path().join("sel.json");
    write(&sel, r#"{"cabinet-color":"oak"}"#);

    let run = |photo_hash: &str| {
        let out = roomkey()
            .args(["key", "--selections"])
            .arg(&sel)
            .args(["--photo-hash", photo_hash])
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };

    let k1 = run("p1");
    let k2 = run("p2");
    assert_eq!(k1.trim().len(), 16);
    assert_ne!(k1, k2);
}

#[test]
fn test_invisible_only_selections_report_nothing_to_render() {
    let dir = tempfile::tempdir().unwrap();
    let sel = dir.path().join("sel.json");
    let vis = dir.path().join("vis.json");
    write(&sel, r#"{"backsplash":"subway-white"}"#);
    write(&vis, r#"{"backsplash":false}"#);

    roomkey()
        .args(["key", "--selections"])
        .arg(&sel)
        .arg("--visibility")
        .arg(&vis)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to render"));
}

#[test]
fn test_check_misses_then_reports_key() {
    let dir = tempfile::tempdir().unwrap();
    let sel = dir.path().join("sel.json");
    let db = dir.path().join("renders.db");
    write(&sel, r#"{"cabinet-color":"oak"}"#);

    roomkey()
        .args(["check", "--photo-id", "kitchen-close", "--selections"])
        .arg(&sel)
        .arg("--db")
        .arg(&db)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("miss "));
}

#[test]
fn test_hidden_lists_suppressed_subcategories() {
    let dir = tempfile::tempdir().unwrap();
    let vis = dir.path().join("vis.json");
    write(&vis, r#"{"backsplash":false,"countertop":true}"#);

    roomkey()
        .args(["hidden", "--visibility"])
        .arg(&vis)
        .assert()
        .success()
        .stdout(predicate::str::contains("backsplash"));
}
