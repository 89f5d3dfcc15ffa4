#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub(crate) const SESSION_LOG_FILE_NAME: &str = "memory_bank_prompt_last_session.txt";

/// Last-invocation diagnostic record in the storage root. Every write is
/// best-effort: a failing log must never fail the conversation start. The
/// record carries a content fingerprint, never the prompt content itself.
#[derive(Clone, Debug)]
pub(crate) struct SessionLog {
    path: PathBuf,
    start_rfc3339: String,
    pid: u32,
    branch: String,
    status: Option<String>,
    content_sha256: Option<String>,
    tokens_estimate: Option<usize>,
    warnings: Vec<String>,
    error: Option<String>,
}

impl SessionLog {
    pub(crate) fn new(storage_dir: &Path, branch: &str) -> Self {
        let this = Self {
            path: storage_dir.join(SESSION_LOG_FILE_NAME),
            start_rfc3339: super::time::now_rfc3339(),
            pid: std::process::id(),
            branch: branch.to_string(),
            status: None,
            content_sha256: None,
            tokens_estimate: None,
            warnings: Vec::new(),
            error: None,
        };
        this.flush();
        this
    }

    pub(crate) fn note_status(&mut self, status: &str) {
        self.status = Some(status.to_string());
        self.flush();
    }

    pub(crate) fn note_content_sha256(&mut self, sha256: &str) {
        self.content_sha256 = Some(sha256.to_string());
        self.flush();
    }

    pub(crate) fn note_tokens_estimate(&mut self, tokens: usize) {
        self.tokens_estimate = Some(tokens);
        self.flush();
    }

    pub(crate) fn note_warning(&mut self, code: &str) {
        self.warnings.push(code.to_string());
        self.flush();
    }

    pub(crate) fn note_error(&mut self, error: &str) {
        let error = error.trim();
        if error.is_empty() {
            return;
        }
        self.error = Some(truncate(error, 300));
        self.flush();
    }

    fn flush(&self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let _ = std::fs::create_dir_all(dir);

        let mut out = String::new();
        push_kv(&mut out, "ts_start", &self.start_rfc3339);
        push_kv(&mut out, "pid", &self.pid.to_string());
        push_kv(&mut out, "branch", &self.branch);
        if let Some(status) = &self.status {
            push_kv(&mut out, "status", status);
        }
        if let Some(sha256) = &self.content_sha256 {
            push_kv(&mut out, "content_sha256", sha256);
        }
        if let Some(tokens) = &self.tokens_estimate {
            push_kv(&mut out, "tokens_estimate", &tokens.to_string());
        }
        if !self.warnings.is_empty() {
            push_kv(&mut out, "warnings", &self.warnings.join(","));
        }
        if let Some(error) = &self.error {
            push_kv(&mut out, "last_error", error);
        }

        let _ = std::fs::write(&self.path, out);
    }
}

fn push_kv(out: &mut String, key: &str, value: &str) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "{key}={value}");
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in value.chars().enumerate() {
        if idx >= max_chars {
            break;
        }
        out.push(ch);
    }
    out
}
