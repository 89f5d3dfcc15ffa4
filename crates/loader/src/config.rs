#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

/// Storage root for branch prompt documents: explicit argument first, then
/// the `MEMORY_BANK_DIR` environment variable, then `.memory_bank` under the
/// enclosing repo root (nearest ancestor with a `.git` entry, else the cwd).
pub fn resolve_storage_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(value) = std::env::var_os("MEMORY_BANK_DIR") {
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    default_repo_root().join(".memory_bank")
}

fn default_repo_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut current = cwd.clone();
    loop {
        if current.join(".git").exists() {
            return current;
        }
        if !current.pop() {
            break;
        }
    }
    cwd
}
