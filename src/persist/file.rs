//! Single-file JSON snapshot store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::core::session::Session;

use super::{PersistResult, SnapshotStore};

/// File name used by [`FileSnapshotStore::in_dir`].
pub const DEFAULT_SNAPSHOT_FILE: &str = "event_queue_storage.dat";

/// Stores the session as one JSON document on disk.
///
/// Saves go to a sibling `.tmp` file first and are renamed over the target,
/// so an interrupted write leaves the previous snapshot readable.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Uses the snapshot file at `path`. Nothing is touched until load/save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses [`DEFAULT_SNAPSHOT_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> PersistResult<Option<Session>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // A literal `null` document is treated as a fresh session.
        let session: Option<Session> = serde_json::from_slice(&bytes)?;
        Ok(Some(session.unwrap_or_default()))
    }

    fn save(&mut self, session: &Session) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec(session)?;
        let tmp = self.tmp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
