#![forbid(unsafe_code)]

mod config;
mod support;

pub use config::resolve_storage_dir;

use mb_core::ids::BranchId;
use mb_core::prepare;
use mb_core::scaffold::PromptStatus;
use mb_storage::{PromptStore, StoreError};
use serde::Serialize;
use std::path::Path;
use support::session_log::SessionLog;
use support::sha256_hex;
use support::warn_log;

pub const WARN_INVALID_BRANCH: &str = "INVALID_BRANCH";
pub const WARN_STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
pub const WARN_STORAGE_CORRUPT: &str = "STORAGE_CORRUPT";
pub const WARN_BUDGET_EXCEEDED: &str = "BUDGET_EXCEEDED";

#[derive(Clone, Debug, Serialize)]
pub struct Warning {
    pub code: &'static str,
    pub message: String,
}

/// What the host conversation engine prepends to model input at session
/// start. `text` is empty for unconfigured branches and for any storage
/// failure; warnings carry the diagnostics either way.
#[derive(Clone, Debug)]
pub struct InjectedContext {
    pub branch: String,
    pub text: String,
    pub status: Option<PromptStatus>,
    pub warnings: Vec<Warning>,
}

impl InjectedContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Resolve-then-prepare pipeline for one conversation start. Never fails:
/// every storage error degrades to an empty context so the conversation can
/// proceed without injected context.
pub fn load_branch_context(storage_dir: &Path, branch: &str) -> InjectedContext {
    let mut log = SessionLog::new(storage_dir, branch);

    let branch_id = match BranchId::try_new(branch) {
        Ok(branch_id) => branch_id,
        Err(err) => {
            return degraded(
                &mut log,
                storage_dir,
                branch,
                WARN_INVALID_BRANCH,
                err.to_string(),
            );
        }
    };

    let store = match PromptStore::open(storage_dir) {
        Ok(store) => store,
        Err(err) => {
            return degraded(
                &mut log,
                storage_dir,
                branch,
                warning_code(&err),
                err.to_string(),
            );
        }
    };

    let doc = match store.resolve(&branch_id) {
        Ok(doc) => doc,
        Err(err) => {
            return degraded(
                &mut log,
                storage_dir,
                branch,
                warning_code(&err),
                err.to_string(),
            );
        }
    };

    log.note_status(doc.status.as_str());
    log.note_content_sha256(&sha256_hex(doc.content.as_bytes()));

    let prepared = prepare::prepare(doc.status, &doc.content);
    log.note_tokens_estimate(prepared.budget.estimated_tokens);

    let mut warnings = Vec::new();
    if prepared.budget.exceeded {
        warnings.push(Warning {
            code: WARN_BUDGET_EXCEEDED,
            message: format!(
                "prompt is ~{} tokens, above the advisory {}-{} window; injecting in full",
                prepared.budget.estimated_tokens,
                prepared.budget.min_tokens,
                prepared.budget.max_tokens
            ),
        });
    }
    for warning in &warnings {
        log.note_warning(warning.code);
        warn_log::append(storage_dir, branch, warning);
    }

    InjectedContext {
        branch: branch.to_string(),
        text: prepared.text,
        status: Some(doc.status),
        warnings,
    }
}

fn warning_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::Unavailable { .. } => WARN_STORAGE_UNAVAILABLE,
        StoreError::Corrupt { .. } => WARN_STORAGE_CORRUPT,
    }
}

fn degraded(
    log: &mut SessionLog,
    storage_dir: &Path,
    branch: &str,
    code: &'static str,
    message: String,
) -> InjectedContext {
    log.note_error(&message);
    log.note_warning(code);
    let warning = Warning { code, message };
    warn_log::append(storage_dir, branch, &warning);
    InjectedContext {
        branch: branch.to_string(),
        text: String::new(),
        status: None,
        warnings: vec![warning],
    }
}
