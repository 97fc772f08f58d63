use assert_cmd::Command;
use memostash::{fingerprint, HashAlgorithm};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn memostash(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("memostash"));
    cmd.arg("--root").arg(root).env_remove("MEMOSTASH_LOG");
    cmd
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

#[test]
fn demo_writes_expected_artifacts() {
    let temp = tempdir().unwrap();

    let assert = memostash(temp.path()).arg("demo").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 5);

    assert!(temp.path().join("image-(50, 50).npy").exists());
    assert!(temp.path().join("images-(50, 50)-20.npz").exists());
    assert!(temp.path().join("plain-hello").exists());

    let paths: Vec<_> = items.iter().map(|i| str_field(i, "path")).collect();
    assert_eq!(paths[0], "image-(50, 50).npy");
    assert_eq!(paths[1], "images-(50, 50)-20.npz");
    assert_eq!(paths[2], "plain-hello");
    assert_eq!(str_field(&items[2], "summary"), "['hello']");
    assert_eq!(str_field(&items[1], "summary"), "20 arrays");

    let hashed = memostash::Value::list(0..100i64);
    assert_eq!(
        paths[4],
        format!("hashed-{}", fingerprint(&hashed, HashAlgorithm::Sha1))
    );
}

#[test]
fn demo_second_run_reports_cache_hits() {
    let temp = tempdir().unwrap();

    memostash(temp.path())
        .arg("demo")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading from cache").not());

    memostash(temp.path())
        .arg("demo")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading from cache"));
}

#[test]
fn quiet_suppresses_hit_notice() {
    let temp = tempdir().unwrap();

    memostash(temp.path()).arg("demo").assert().success();
    memostash(temp.path())
        .arg("--quiet")
        .arg("demo")
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading from cache").not());
}

#[test]
fn list_reports_artifacts_with_codecs() {
    let temp = tempdir().unwrap();
    memostash(temp.path()).arg("demo").assert().success();

    let assert = memostash(temp.path()).arg("list").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    let listed: Vec<_> = items
        .iter()
        .map(|i| (str_field(i, "path"), str_field(i, "codec")))
        .collect();

    assert_eq!(listed.len(), 4);
    assert!(listed.contains(&("image-(50, 50).npy", "npy")));
    assert!(listed.contains(&("images-(50, 50)-20.npz", "npz")));
    assert!(listed.contains(&("plain-hello", "object")));
    assert!(items.iter().all(|i| i["kind"] == "artifact"));
}

#[test]
fn inspect_describes_npy_artifact() {
    let temp = tempdir().unwrap();
    memostash(temp.path()).arg("demo").assert().success();

    let assert = memostash(temp.path())
        .arg("inspect")
        .arg("image-(50, 50).npy")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(items.len(), 1);
    assert_eq!(
        str_field(&items[0], "summary"),
        "array(shape=(50, 50), dtype=float64)"
    );
    assert_eq!(items[0]["data"]["shape"], serde_json::json!([50, 50]));
    assert_eq!(str_field(&items[0], "fingerprint").len(), 40);
}

#[test]
fn inspect_corrupt_artifact_fails() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("bad.npy"), b"not an array").unwrap();

    memostash(temp.path())
        .arg("inspect")
        .arg("bad.npy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.npy"));
}

#[test]
fn fingerprint_matches_library() {
    let temp = tempdir().unwrap();

    let assert = memostash(temp.path())
        .arg("fingerprint")
        .arg("[1, 2, 3]")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    let expected = fingerprint(&memostash::Value::list([1, 2, 3]), HashAlgorithm::Sha1);
    assert_eq!(str_field(&items[0], "fingerprint"), expected);
}

#[test]
fn fingerprint_xxh3_is_shorter() {
    let temp = tempdir().unwrap();

    let assert = memostash(temp.path())
        .arg("--hash-algorithm")
        .arg("xxh3")
        .arg("fingerprint")
        .arg("(50, 50)")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "fingerprint").len(), 16);
}

#[test]
fn path_resolves_without_computing() {
    let temp = tempdir().unwrap();

    let assert = memostash(temp.path())
        .arg("path")
        .arg("images-{shape}-{size}.npz")
        .arg("--arg")
        .arg("shape=(50, 50)")
        .arg("--arg")
        .arg("size=20")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(str_field(&items[0], "path"), "images-(50, 50)-20.npz");
    assert_eq!(str_field(&items[0], "codec"), "npz");
    assert_eq!(items[0]["meta"]["exists"], false);
    assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[test]
fn path_with_hashed_field() {
    let temp = tempdir().unwrap();

    let assert = memostash(temp.path())
        .arg("path")
        .arg("hashed-{x}")
        .arg("--arg")
        .arg("x=[1, 2, 3]")
        .arg("--hash")
        .arg("x")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);

    let expected = fingerprint(&memostash::Value::list([1, 2, 3]), HashAlgorithm::Sha1);
    assert_eq!(str_field(&items[0], "path"), format!("hashed-{}", expected));
}

#[test]
fn path_missing_argument_fails() {
    let temp = tempdir().unwrap();

    memostash(temp.path())
        .arg("--no-color")
        .arg("path")
        .arg("images-{shape}-{size}.npz")
        .arg("--arg")
        .arg("shape=(50, 50)")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "couldn't find argument size needed for images-{shape}-{size}.npz",
        ));
}

#[test]
fn markdown_output_has_sections() {
    let temp = tempdir().unwrap();
    memostash(temp.path()).arg("demo").assert().success();

    memostash(temp.path())
        .arg("--format")
        .arg("md")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("## Artifacts"));
}
