#![forbid(unsafe_code)]

use mb_core::scaffold::{self, PromptStatus};
use mb_loader::{
    InjectedContext, WARN_BUDGET_EXCEEDED, WARN_INVALID_BRANCH, WARN_STORAGE_CORRUPT,
    WARN_STORAGE_UNAVAILABLE, load_branch_context, resolve_storage_dir,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SESSION_LOG: &str = "memory_bank_prompt_last_session.txt";
const WARN_LOG: &str = "prompt_warnings.jsonl";

fn temp_storage_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("mb_loader_{test_name}_{nonce}"));
    fs::create_dir_all(&dir).expect("create temp storage dir");
    dir
}

fn write_branch_prompt(storage_dir: &Path, branch: &str, content: &str) {
    let dir = storage_dir.join(branch);
    fs::create_dir_all(&dir).expect("create branch dir");
    fs::write(dir.join("system-prompt.md"), content).expect("write branch prompt");
}

fn warning_codes(context: &InjectedContext) -> Vec<&'static str> {
    context.warnings.iter().map(|w| w.code).collect()
}

#[test]
fn unconfigured_branch_injects_nothing() {
    let storage_dir = temp_storage_dir("unconfigured");

    let context = load_branch_context(&storage_dir, "alpha");
    assert!(context.is_empty(), "scaffold must not be injected");
    assert_eq!(context.status, Some(PromptStatus::NeedsConfiguration));
    assert!(context.warnings.is_empty(), "{:?}", context.warnings);

    // The scaffold was still materialized for the editor to customize.
    let on_disk = fs::read_to_string(storage_dir.join("alpha").join("system-prompt.md"))
        .expect("scaffold on disk");
    assert_eq!(on_disk, scaffold::SCAFFOLD);

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn configured_branch_injects_content_verbatim() {
    let storage_dir = temp_storage_dir("configured");
    let content = "You are in the billing-support branch. Always cite ticket IDs.";
    write_branch_prompt(&storage_dir, "beta", content);

    let context = load_branch_context(&storage_dir, "beta");
    assert_eq!(context.text, content);
    assert_eq!(context.status, Some(PromptStatus::Configured));
    assert!(context.warnings.is_empty(), "{:?}", context.warnings);

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn over_budget_content_injects_in_full_with_one_warning() {
    let storage_dir = temp_storage_dir("over_budget");
    let content = "Always remember the escalation matrix. ".repeat(40);
    write_branch_prompt(&storage_dir, "beta", &content);

    let context = load_branch_context(&storage_dir, "beta");
    assert_eq!(context.text, content, "advisory budget must not block or trim");
    assert_eq!(warning_codes(&context), vec![WARN_BUDGET_EXCEEDED]);

    let warn_log = fs::read_to_string(storage_dir.join(WARN_LOG)).expect("warn log written");
    let lines = warn_log.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 1, "exactly one advisory warning: {lines:?}");
    let record: serde_json::Value = serde_json::from_str(lines[0]).expect("warn line is json");
    assert_eq!(record.get("code").and_then(|v| v.as_str()), Some(WARN_BUDGET_EXCEEDED));
    assert_eq!(record.get("branch").and_then(|v| v.as_str()), Some("beta"));

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn invalid_branch_degrades_to_empty_context() {
    let storage_dir = temp_storage_dir("invalid_branch");

    let context = load_branch_context(&storage_dir, "a/../etc");
    assert!(context.is_empty());
    assert_eq!(context.status, None);
    assert_eq!(warning_codes(&context), vec![WARN_INVALID_BRANCH]);

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn unavailable_storage_degrades_to_empty_context() {
    let base = temp_storage_dir("unavailable");
    let storage_dir = base.join("occupied");
    fs::write(&storage_dir, "file, not dir").expect("write squatter");

    let context = load_branch_context(&storage_dir, "alpha");
    assert!(context.is_empty());
    assert_eq!(warning_codes(&context), vec![WARN_STORAGE_UNAVAILABLE]);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn corrupt_document_degrades_without_rewrite() {
    let storage_dir = temp_storage_dir("corrupt");
    let bad = [0x4d, 0x42, 0xff, 0xfe];
    let dir = storage_dir.join("delta");
    fs::create_dir_all(&dir).expect("create branch dir");
    fs::write(dir.join("system-prompt.md"), bad).expect("write bad bytes");

    let context = load_branch_context(&storage_dir, "delta");
    assert!(context.is_empty());
    assert_eq!(warning_codes(&context), vec![WARN_STORAGE_CORRUPT]);
    assert_eq!(
        fs::read(dir.join("system-prompt.md")).expect("bytes still there"),
        bad,
        "corrupt document must not be rewritten"
    );

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn session_log_records_fingerprint_not_content() {
    let storage_dir = temp_storage_dir("session_log");
    let content = "You are in the billing-support branch. Always cite ticket IDs.";
    write_branch_prompt(&storage_dir, "beta", content);

    let context = load_branch_context(&storage_dir, "beta");
    assert_eq!(context.text, content);

    let log = fs::read_to_string(storage_dir.join(SESSION_LOG)).expect("session log written");
    assert!(log.contains("branch=beta"), "log: {log}");
    assert!(log.contains("status=configured"), "log: {log}");
    assert!(log.contains("content_sha256="), "log: {log}");
    assert!(log.contains("tokens_estimate="), "log: {log}");
    assert!(
        !log.contains("billing-support branch"),
        "prompt content must never land in the session log: {log}"
    );

    let _ = fs::remove_dir_all(&storage_dir);
}

#[test]
fn explicit_storage_dir_wins_over_defaults() {
    let dir = temp_storage_dir("config_explicit");
    assert_eq!(resolve_storage_dir(Some(&dir)), dir);
    let _ = fs::remove_dir_all(&dir);
}
