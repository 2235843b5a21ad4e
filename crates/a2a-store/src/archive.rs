//! Local per-session copies of canonical trace bytes.

use a2a_canonical::SessionId;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// File extension of archived traces.
pub const TRACE_FILE_EXTENSION: &str = "json";

/// Directory holding one canonical-byte trace file per session.
///
/// Files are named `<session_id>.json` and contain the canonical bytes
/// exactly; they are the durable local copy kept before and independent of
/// remote anchoring.
#[derive(Debug, Clone)]
pub struct SessionArchive {
    dir: PathBuf,
    sync: bool,
}

impl SessionArchive {
    /// Opens (creating if needed) an archive directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, sync: false })
    }

    /// Whether to fsync each written file (default: false).
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Archive directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the trace file for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] when the id is not a valid session
    /// id, which also rules out path separators.
    pub fn path_for(&self, session_id: &SessionId) -> Result<PathBuf, StoreError> {
        let checked = SessionId::parse(session_id.as_str())?;
        Ok(self
            .dir
            .join(format!("{}.{}", checked.as_str(), TRACE_FILE_EXTENSION)))
    }

    /// Writes `bytes` as the trace file of `session_id`, replacing any
    /// previous copy atomically.
    pub fn write(&self, session_id: &SessionId, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.path_for(session_id)?;
        let tmp = path.with_extension(format!("{}.tmp", TRACE_FILE_EXTENSION));
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(bytes)?;
            file.flush()?;
            if self.sync {
                file.sync_all()?;
            }
        }
        fs::rename(&tmp, &path)?;
        tracing::debug!(session_id = %session_id, path = %path.display(), size = bytes.len(), "archived trace");
        Ok(path)
    }

    /// Reads the archived bytes of `session_id`.
    pub fn read(&self, session_id: &SessionId) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(session_id)?;
        Ok(fs::read(path)?)
    }

    /// True when a trace file exists for `session_id`.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.path_for(session_id)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Session ids with an archived trace, sorted.
    pub fn list(&self) -> Result<Vec<SessionId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TRACE_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = SessionId::parse(stem) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Reads a trace file from an arbitrary path.
pub fn read_trace_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, StoreError> {
    Ok(fs::read(path)?)
}
