//! JSON collection store backing each manager.
//!
//! A store is a single file holding the full collection as a pretty-printed
//! JSON array. Reads are forgiving (a missing or corrupt file is an empty
//! collection); writes replace the whole file atomically and report failure.
//!
//! A file that exists but cannot be read back is never overwritten in place.
//! It stays untouched until the first save, which first renames it to
//! `<file>.corrupt` (or `<file>.corrupt.N` when that name is taken).

use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use health_core::error::{HealthError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// File-backed store for one entity type.
#[derive(Debug, Clone)]
pub struct CollectionStore<T> {
    path: PathBuf,
    /// Set when the last load found a file it could not use.
    unreadable: bool,
    _records: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> CollectionStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unreadable: false,
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` when the file on disk could not be loaded and has not been set
    /// aside yet.
    pub fn is_unreadable(&self) -> bool {
        self.unreadable
    }

    /// Read the whole collection.
    ///
    /// Never fails: a missing file, an unreadable file, or content that is not
    /// a JSON array of records all yield an empty collection. The latter two
    /// mark the store unreadable.
    pub fn load(&mut self) -> Vec<T> {
        self.unreadable = false;

        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file absent; starting empty");
            return Vec::new();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.path.display(),
                    "failed to read store file; starting empty, file kept until the first write"
                );
                self.unreadable = true;
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(records) => {
                debug!(path = %self.path.display(), count = records.len(), "store loaded");
                records
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %self.path.display(),
                    "failed to deserialise store; starting empty, file kept until the first write"
                );
                self.unreadable = true;
                Vec::new()
            }
        }
    }

    /// Overwrite the store with `records`.
    ///
    /// Writes to a sibling temp file and renames it over the target, creating
    /// parent directories as needed. An unreadable file is set aside first; if
    /// that fails nothing is written.
    pub fn save(&mut self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }

        if self.unreadable {
            self.set_aside()?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| self.write_error(source))?;
        std::fs::rename(&tmp, &self.path).map_err(|source| self.write_error(source))?;

        debug!(path = %self.path.display(), count = records.len(), "store saved");
        Ok(())
    }

    /// Move the unreadable file to the first free `.corrupt` name.
    fn set_aside(&mut self) -> Result<()> {
        let target = self.corrupt_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => {
                warn!(
                    path = %self.path.display(),
                    moved_to = %target.display(),
                    "unreadable store set aside before overwrite"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(self.write_error(source)),
        }
        self.unreadable = false;
        Ok(())
    }

    fn corrupt_path(&self) -> PathBuf {
        let with_suffix = |suffix: &str| {
            let mut name = OsString::from(self.path.as_os_str());
            name.push(suffix);
            PathBuf::from(name)
        };

        let mut candidate = with_suffix(".corrupt");
        let mut n = 1;
        while candidate.exists() {
            candidate = with_suffix(&format!(".corrupt.{n}"));
            n += 1;
        }
        candidate
    }

    fn write_error(&self, source: std::io::Error) -> HealthError {
        HealthError::StoreWrite {
            path: self.path.clone(),
            source,
        }
    }
}
