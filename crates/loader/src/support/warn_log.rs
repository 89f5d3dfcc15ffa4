#![forbid(unsafe_code)]

use crate::Warning;
use serde::Serialize;
use std::io::Write as _;
use std::path::Path;

pub(crate) const WARN_LOG_FILE_NAME: &str = "prompt_warnings.jsonl";

#[derive(Serialize)]
struct WarnRecord<'a> {
    ts: String,
    branch: &'a str,
    code: &'a str,
    message: &'a str,
}

/// Append one advisory warning as a JSON line. Best-effort by contract:
/// diagnostics never block injection.
pub(crate) fn append(storage_dir: &Path, branch: &str, warning: &Warning) {
    let record = WarnRecord {
        ts: super::time::now_rfc3339(),
        branch,
        code: warning.code,
        message: &warning.message,
    };
    let Ok(mut line) = serde_json::to_string(&record) else {
        return;
    };
    line.push('\n');

    let _ = std::fs::create_dir_all(storage_dir);
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(storage_dir.join(WARN_LOG_FILE_NAME))
    else {
        return;
    };
    let _ = file.write_all(line.as_bytes());
}
