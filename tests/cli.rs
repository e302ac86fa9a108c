//! Integration tests for the sfxi command line.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::OnceLock;

static FIXTURE_DIR: OnceLock<PathBuf> = OnceLock::new();

const SCHEMA: &str = "title TEXT WITHSUFFIXTRIE body TEXT tags TAG SEPARATOR ; WITHSUFFIXTRIE";

fn get_fixture_dir() -> PathBuf {
    FIXTURE_DIR.get_or_init(create_fixture_dir).clone()
}

fn create_fixture_dir() -> PathBuf {
    let dir = std::env::temp_dir()
        .join("sfxi_test_fixtures")
        .join(format!("test_{}", std::process::id()));

    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create fixture dir");

    fs::write(
        dir.join("docs.jsonl"),
        r#"{"key": "doc1", "fields": {"title": "hello world", "body": "this is a test", "tags": "Rust;Search"}}
{"key": "doc2", "fields": {"title": "keyword", "tags": "search;engine"}}
{"key": "doc3", "fields": {"title": "doctorless", "body": "wordless"}}
{"key": "doc4", "fields": {"title": "bold"}}
{"key": "doc4", "delete": true}
"#,
    )
    .expect("Failed to write docs");

    fs::write(dir.join("broken.jsonl"), "{\"key\": \"a\"}\nnot json\n").expect("Failed to write docs");

    dir
}

fn docs(name: &str) -> String {
    get_fixture_dir().join(name).to_string_lossy().into_owned()
}

/// Run sfxi with given args, returning (stdout, stderr, success)
fn run_sfxi(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_sfxi"))
        .args(args)
        .arg("--no-color")
        .output()
        .expect("Failed to run sfxi");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn search(pattern: &str, extra: &[&str]) -> (String, String, bool) {
    let path = docs("docs.jsonl");
    let mut args = vec!["search", "-s", SCHEMA, "-d", &path, pattern];
    args.extend_from_slice(extra);
    run_sfxi(&args)
}

fn keys(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter(|l| l.starts_with("doc"))
        .collect()
}

#[test]
fn test_search_contains() {
    let (out, _, ok) = search("*orl*", &[]);
    assert!(ok);
    assert_eq!(keys(&out), vec!["doc1", "doc3"]);
    assert!(out.contains("2 documents, 2 terms matched"));
}

#[test]
fn test_search_suffix_across_text_fields() {
    let (out, _, ok) = search("*less", &[]);
    assert!(ok);
    assert_eq!(keys(&out), vec!["doc3"]);
    assert!(out.contains("2 terms matched"));
}

#[test]
fn test_search_field_scope() {
    let (out, _, ok) = search("*earch", &["--field", "tags"]);
    assert!(ok);
    assert_eq!(keys(&out), vec!["doc1", "doc2"]);

    let (out, _, ok) = search("@body:word*", &[]);
    assert!(ok);
    assert_eq!(keys(&out), vec!["doc3"]);

    let (_, err, ok) = search("@body:*ord*", &[]);
    assert!(!ok);
    assert!(err.contains("without WITHSUFFIXTRIE support"));
}

#[test]
fn test_search_params() {
    let (out, _, ok) = search("$p*", &["-p", "p=key"]);
    assert!(ok);
    assert_eq!(keys(&out), vec!["doc2"]);

    let (_, err, ok) = search("$missing*", &[]);
    assert!(!ok);
    assert!(err.contains("No such parameter"));
}

#[test]
fn test_search_deleted_document_is_gone() {
    let (out, _, ok) = search("*old", &[]);
    assert!(ok);
    assert!(keys(&out).is_empty());
    assert!(out.contains("0 documents"));
}

#[test]
fn test_dump_field() {
    let path = docs("docs.jsonl");
    let (out, _, ok) = run_sfxi(&["dump", "-s", SCHEMA, "-d", &path, "title", "--gc"]);
    assert!(ok);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines.contains(&"world"));
    assert!(lines.contains(&"orld"));
    assert!(!lines.contains(&"bold"));
    assert!(!lines.contains(&"d"));
}

#[test]
fn test_dump_unknown_field() {
    let path = docs("docs.jsonl");
    let (_, err, ok) = run_sfxi(&["dump", "-s", SCHEMA, "-d", &path, "nope"]);
    assert!(!ok);
    assert!(err.contains("Could not find given field in index spec"));
}

#[test]
fn test_stats_json() {
    let path = docs("docs.jsonl");
    let (out, _, ok) = run_sfxi(&["stats", "-s", SCHEMA, "-d", &path, "--json"]);
    assert!(ok);
    let stats: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
    assert_eq!(stats["doc_count"], 3);
    assert_eq!(stats["fields"].as_array().map(|f| f.len()), Some(3));
    assert_eq!(stats["fields"][1]["suffix_trie"], serde_json::Value::Null);
}

#[test]
fn test_bad_schema_and_docs() {
    let path = docs("docs.jsonl");
    let (_, err, ok) = run_sfxi(&["search", "-s", "t TEXT SORTABLE NOSTEM", "-d", &path, "x*"]);
    assert!(!ok);
    assert!(err.contains("must be declared before SORTABLE"));

    let broken = docs("broken.jsonl");
    let (_, err, ok) = run_sfxi(&["search", "-s", SCHEMA, "-d", &broken, "x*"]);
    assert!(!ok);
    assert!(err.contains("line 2"));
}
