#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum StoreError {
    /// The branch root (or the document under it) cannot be reached or
    /// written. The conversation proceeds without injected context.
    Unavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An existing document cannot be decoded as UTF-8 text. Treated by
    /// callers as if no document existed for this invocation; never rewritten.
    Corrupt { path: PathBuf },
}

impl StoreError {
    pub(crate) fn unavailable(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl AsRef<Path>) -> Self {
        Self::Corrupt {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { path, source } => {
                write!(f, "storage unavailable at {}: {source}", path.display())
            }
            Self::Corrupt { path } => {
                write!(f, "document at {} is not valid text", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            Self::Corrupt { .. } => None,
        }
    }
}
