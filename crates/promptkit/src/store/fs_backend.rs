use super::backend::StorageBackend;
use crate::error::{PromptError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Filesystem backend rooted at one storage directory.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a storage-relative path to a real one, refusing anything that
    /// could leave the root (absolute paths, `..`).
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(PromptError::Store(format!(
                        "path '{}' is outside the storage root",
                        path
                    )))
                }
            }
        }
        Ok(resolved)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(PromptError::Io)?;
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PromptError::Io(e)),
        }
    }

    fn write_atomic(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        let parent = target
            .parent()
            .ok_or_else(|| PromptError::Store(format!("cannot write to '{}'", path)))?;
        self.ensure_dir(parent)?;

        // Hidden temp name in the same directory so the rename stays on one
        // filesystem and listings never pick it up.
        let tmp_path = parent.join(format!(".promptkit-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, bytes).map_err(PromptError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, &target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PromptError::Io(e));
        }
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PromptError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        let full = self.resolve(path)?;
        match fs::metadata(&full) {
            Ok(meta) => {
                let modified = meta.modified().map_err(PromptError::Io)?;
                Ok(Some(modified.into()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PromptError::Io(e)),
        }
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let start = self.resolve(dir)?;
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&start)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable entry under {}: {}", start.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match self.relative(entry.path()) {
                Some(rel) => files.push(rel),
                None => log::warn!("skipping non UTF-8 path {}", entry.path().display()),
            }
        }

        files.sort();
        Ok(files)
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        self.resolve(path)
    }
}
