//! File-backed session store.
//!
//! Each key is one file inside the session directory. Writes go to a temporary
//! file in the same directory and are renamed into place, so a reader sees
//! either the old entry or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, SessionStore};

/// A [`SessionStore`] keeping one file per key in a directory.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
    // Owns the directory of an ephemeral session; deleting it ends the session.
    _session: Option<TempDir>,
}

impl FileSessionStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "session store opened");
        Ok(Self {
            dir,
            _session: None,
        })
    }

    /// Create a store in a fresh temporary directory that is removed on drop.
    pub fn ephemeral() -> StoreResult<Self> {
        let session = tempfile::tempdir()?;
        Ok(Self {
            dir: session.path().to_path_buf(),
            _session: Some(session),
        })
    }

    /// The directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.entry_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::CorruptEntry {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.entry_path(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(key, bytes = value.len(), "entry written");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<bool> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Temporary files from in-flight writes start with '.', which
            // validate_key rejects.
            if let Some(name) = entry.file_name().to_str() {
                if validate_key(name).is_ok() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> StoreResult<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}
