#![forbid(unsafe_code)]

mod error;

pub use error::StoreError;

use mb_core::ids::BranchId;
use mb_core::scaffold::{self, PromptStatus};
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub const PROMPT_FILE_NAME: &str = "system-prompt.md";
const META_FILE_NAME: &str = "prompt.meta.json";

#[derive(Clone, Debug)]
pub struct BranchPromptDocument {
    pub branch_id: BranchId,
    pub location: PathBuf,
    pub content: String,
    pub status: PromptStatus,
}

/// Filesystem-backed store for per-branch system prompt documents. One
/// document per branch at `<root>/<branch>/system-prompt.md`; the store only
/// ever reads, or writes once under create-if-missing.
#[derive(Debug)]
pub struct PromptStore {
    root: PathBuf,
}

impl PromptStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|err| StoreError::unavailable(&root, err))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prompt_location(&self, branch: &BranchId) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in branch.segments() {
            dir.push(segment);
        }
        dir.join(PROMPT_FILE_NAME)
    }

    /// Read the branch document, scaffolding it first if the branch has none.
    /// The result is never "no document": either the existing bytes come back
    /// verbatim, or the freshly published scaffold does.
    pub fn resolve(&self, branch: &BranchId) -> Result<BranchPromptDocument, StoreError> {
        let location = self.prompt_location(branch);
        if let Some(content) = read_existing(&location)? {
            return Ok(document(branch, location, content));
        }
        let content = self.create_scaffold(&location)?;
        Ok(document(branch, location, content))
    }

    fn create_scaffold(&self, location: &Path) -> Result<String, StoreError> {
        let Some(dir) = location.parent() else {
            return Err(StoreError::unavailable(
                location,
                std::io::Error::new(ErrorKind::NotFound, "prompt location has no parent"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|err| StoreError::unavailable(dir, err))?;

        let scaffold_text = scaffold::render_scaffold();
        match create_if_missing(location, &scaffold_text)? {
            CreateOutcome::Created => {
                write_meta_best_effort(dir);
                Ok(scaffold_text)
            }
            // Lost a concurrent first-access race; the winner's bytes are
            // the document.
            CreateOutcome::AlreadyExists => read_existing(location)?.ok_or_else(|| {
                StoreError::unavailable(
                    location,
                    std::io::Error::new(ErrorKind::NotFound, "document vanished after create race"),
                )
            }),
        }
    }
}

fn document(branch: &BranchId, location: PathBuf, content: String) -> BranchPromptDocument {
    let status = scaffold::classify(&content);
    BranchPromptDocument {
        branch_id: branch.clone(),
        location,
        content,
        status,
    }
}

fn read_existing(location: &Path) -> Result<Option<String>, StoreError> {
    let bytes = match std::fs::read(location) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::unavailable(location, err)),
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => Err(StoreError::corrupt(location)),
    }
}

enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Publish `text` at `location` only if nothing exists there yet. The content
/// lands in a sibling temp file first and is published via `hard_link`, which
/// fails with `AlreadyExists` when a concurrent first-writer won; readers
/// never observe a partially written document.
fn create_if_missing(location: &Path, text: &str) -> Result<CreateOutcome, StoreError> {
    let Some(dir) = location.parent() else {
        return Err(StoreError::unavailable(
            location,
            std::io::Error::new(ErrorKind::NotFound, "prompt location has no parent"),
        ));
    };
    // Per-call unique name: concurrent first-writers in the same process
    // must never share a temp file.
    static TMP_NONCE: AtomicU64 = AtomicU64::new(0);
    let tmp = dir.join(format!(
        ".{PROMPT_FILE_NAME}.tmp.{}.{}.{}",
        std::process::id(),
        now_ms(),
        TMP_NONCE.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&tmp, text).map_err(|err| StoreError::unavailable(&tmp, err))?;
    let publish = std::fs::hard_link(&tmp, location);
    let _ = std::fs::remove_file(&tmp);
    match publish {
        Ok(()) => Ok(CreateOutcome::Created),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
        Err(err) => Err(StoreError::unavailable(location, err)),
    }
}

// Diagnostic sidecar only; the resolve path never reads it.
fn write_meta_best_effort(dir: &Path) {
    let meta = json!({
        "created_at_ms": now_ms(),
        "scaffold_version": scaffold::SCAFFOLD_VERSION,
    });
    let Ok(text) = serde_json::to_string_pretty(&meta) else {
        return;
    };
    let _ = std::fs::write(dir.join(META_FILE_NAME), text);
}

fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis() as i64
}
