use super::backend::{is_hidden_path, StorageBackend};
use crate::error::{PromptError, Result};
use chrono::{DateTime, Duration, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone)]
struct MemFile {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since stores are driven from one
/// thread. This keeps the `StorageBackend` trait on `&self` without locks.
///
/// Modification times come from a clock that never repeats, so two writes in
/// quick succession always get distinct times.
pub struct MemBackend {
    files: RefCell<BTreeMap<String, MemFile>>,
    clock: Cell<DateTime<Utc>>,
    simulate_write_error: Cell<bool>,
    simulate_modified_error: Cell<bool>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            clock: Cell::new(DateTime::<Utc>::MIN_UTC),
            simulate_write_error: Cell::new(false),
            simulate_modified_error: Cell::new(false),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Make `modified` fail, as a stat on a vanished or unreadable file would.
    pub fn set_simulate_modified_error(&self, simulate: bool) {
        self.simulate_modified_error.set(simulate);
    }

    /// Test helper to set a modification time directly.
    /// Returns true if the file existed and was updated.
    pub fn set_modified(&self, path: &str, modified: DateTime<Utc>) -> bool {
        match self.files.borrow_mut().get_mut(path) {
            Some(file) => {
                file.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Test helper to overwrite bytes without touching the modification time,
    /// as a coarse-grained filesystem clock would.
    pub fn replace_bytes_keep_mtime(&self, path: &str, bytes: &[u8]) -> bool {
        match self.files.borrow_mut().get_mut(path) {
            Some(file) => {
                file.bytes = bytes.to_vec();
                true
            }
            None => false,
        }
    }

    fn tick(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let last = self.clock.get();
        let next = if now > last {
            now
        } else {
            last + Duration::nanoseconds(1)
        };
        self.clock.set(next);
        next
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.borrow().get(path).map(|f| f.bytes.clone()))
    }

    fn write_atomic(&self, path: &str, bytes: &[u8]) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(PromptError::Store("Simulated write error".to_string()));
        }
        let modified = self.tick();
        self.files.borrow_mut().insert(
            path.to_string(),
            MemFile {
                bytes: bytes.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<bool> {
        Ok(self.files.borrow_mut().remove(path).is_some())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        if self.simulate_modified_error.get() {
            return Err(PromptError::Store("Simulated stat error".to_string()));
        }
        Ok(self.files.borrow().get(path).map(|f| f.modified))
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let dir = dir.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .filter(|path| !is_hidden_path(&path[prefix.len()..]))
            .cloned()
            .collect())
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(format!("memory://{}", path)))
    }
}
