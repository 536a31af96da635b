//! Log store: load, atomic flush, and the display-only active view

use crate::codec::{CodecError, LogEncoding};
use crate::io::atomic_write;
use marklog_core::MarkupEntry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted log unreadable. Recoverable: the caller starts from an
    /// empty table and warns, annotation work is never blocked.
    #[error("corrupt markup log at {path}")]
    CorruptLog {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    /// Write failure during flush. Surfaced so the session close can be
    /// aborted and retried; the prior persisted log is untouched.
    #[error("failed to flush markup log to {path}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read markup log at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Encode(#[from] CodecError),
}

/// Persists one session's markup log in the configured encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStore {
    encoding: LogEncoding,
}

impl LogStore {
    pub fn new(encoding: LogEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> LogEncoding {
        self.encoding
    }

    /// Path of the persisted log for this store's encoding
    pub fn log_path(&self, session_folder: &Path) -> PathBuf {
        session_folder.join(self.encoding.file_name())
    }

    /// Read the persisted log for a session. Reads whichever encoding's
    /// file is present, preferring the configured one; a session folder
    /// with no log yields an empty snapshot.
    pub fn load(&self, session_folder: &Path) -> Result<Vec<MarkupEntry>, StoreError> {
        for encoding in [self.encoding, self.encoding.other()] {
            let path = session_folder.join(encoding.file_name());
            if !path.exists() {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            let rows = encoding
                .codec()
                .decode(&bytes)
                .map_err(|source| StoreError::CorruptLog {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), rows = rows.len(), "loaded markup log");
            return Ok(rows);
        }
        Ok(Vec::new())
    }

    /// Write the full ordered snapshot, Deleted rows included, via temp
    /// file + rename. Repeated flushes are idempotent overwrites.
    pub fn flush(&self, session_folder: &Path, snapshot: &[MarkupEntry]) -> Result<(), StoreError> {
        let path = self.log_path(session_folder);
        let bytes = self.encoding.codec().encode(snapshot)?;
        atomic_write(&path, &bytes).map_err(|source| StoreError::Flush {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), rows = snapshot.len(), "flushed markup log");
        Ok(())
    }
}

/// Active rows only, for display. Never the basis for a flush: the
/// persisted log keeps its deletion history.
pub fn project_active_view(snapshot: &[MarkupEntry]) -> Vec<MarkupEntry> {
    snapshot.iter().filter(|e| e.is_active()).cloned().collect()
}
