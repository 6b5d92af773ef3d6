use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Abstract interface for raw storage I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`super::PromptStore`] handles the "what" (caching, archival, validation).
///
/// Paths are storage-relative and use `/` as separator on every platform,
/// e.g. `prompts/personal/code-review.md`.
pub trait StorageBackend {
    /// Read a file's raw bytes.
    /// Returns Ok(None) if the file does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write a file, creating parent directories as needed.
    /// MUST be atomic (write to a temp file, then rename) so a concurrent
    /// reader never sees a partially written file.
    fn write_atomic(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Remove a file. Returns false if it did not exist.
    fn remove(&self, path: &str) -> Result<bool>;

    fn exists(&self, path: &str) -> bool;

    /// Modification time of a file, None if it does not exist.
    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>>;

    /// All files below `dir`, recursively, sorted. Hidden entries (names
    /// starting with `.`) are skipped, which also hides temp files and the
    /// cache directory. A missing `dir` yields an empty list.
    fn list_files(&self, dir: &str) -> Result<Vec<String>>;

    /// The location a storage-relative path maps to.
    /// For FsBackend this is the real path. For MemBackend, a virtual path.
    fn full_path(&self, path: &str) -> Result<PathBuf>;
}

/// True if any `/`-separated component of `path` is hidden.
pub(crate) fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|c| c.starts_with('.'))
}
