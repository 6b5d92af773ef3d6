//! # Storage Root Resolution
//!
//! Everything lives under one storage root. [`initialize`] picks it, loads its
//! configuration, makes sure the directory layout exists and hands back a
//! ready [`PromptContext`].
//!
//! ## Root Resolution
//!
//! 1. An explicit `root_override` (e.g. a `--root` flag in the embedding app).
//! 2. The `PROMPTKIT_ROOT` environment variable.
//! 3. The OS data directory via the `directories` crate
//!    (`~/.local/share/promptkit` on Linux).
//!
//! ## Layout
//!
//! [`init_layout`] creates `prompts/`, `templates/` and `archive/`. It is
//! idempotent and never touches existing files. The cache directory is created
//! on first write.

use crate::api::PromptApi;
use crate::config::StoreConfig;
use crate::error::{PromptError, Result};
use crate::store::fs_backend::FsBackend;
use crate::store::{PromptStore, ARCHIVE_DIR, PROMPTS_DIR, TEMPLATES_DIR};
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the storage root.
pub const ROOT_ENV: &str = "PROMPTKIT_ROOT";

/// Configuration file name, looked up in the storage root.
pub const CONFIG_FILE: &str = "promptkit.toml";

pub struct PromptContext {
    pub api: PromptApi<FsBackend>,
    pub config: StoreConfig,
    pub root: PathBuf,
}

/// Picks the storage root: override, then `PROMPTKIT_ROOT`, then the OS
/// data directory.
pub fn resolve_root(root_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = root_override {
        return Ok(root);
    }
    if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    ProjectDirs::from("com", "promptkit", "promptkit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PromptError::Store("could not determine a data directory".to_string()))
}

/// Loads `promptkit.toml` from `root`, layered under `PROMPTKIT__*`
/// environment variables. A missing or unreadable file yields the defaults.
pub fn load_config(root: &Path) -> StoreConfig {
    Clapfig::builder()
        .app_name("promptkit")
        .file_name(CONFIG_FILE)
        .search_paths(vec![SearchPath::Path(root.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Creates the top-level directories of a storage root.
pub fn init_layout(root: &Path) -> Result<()> {
    for dir in [PROMPTS_DIR, TEMPLATES_DIR, ARCHIVE_DIR] {
        fs::create_dir_all(root.join(dir))?;
    }
    Ok(())
}

/// Resolves the root, loads config, prepares the layout and opens the store.
pub fn initialize(root_override: Option<PathBuf>) -> Result<PromptContext> {
    let root = resolve_root(root_override)?;
    let config = load_config(&root);
    init_layout(&root)?;
    log::debug!(
        "storage root {} (ext {}, pack {})",
        root.display(),
        config.file_ext(),
        config.default_pack()
    );

    let store = PromptStore::open(FsBackend::new(root.clone())).with_file_ext(&config.file_ext());
    let api = PromptApi::new(store, config.clone());

    Ok(PromptContext { api, config, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_wins() {
        let temp = TempDir::new().unwrap();
        let root = resolve_root(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_init_layout_is_idempotent() {
        let temp = TempDir::new().unwrap();
        init_layout(temp.path()).unwrap();
        fs::write(temp.path().join("prompts").join("keep.md"), "x").unwrap();
        init_layout(temp.path()).unwrap();

        for dir in ["prompts", "templates", "archive"] {
            assert!(temp.path().join(dir).is_dir());
        }
        assert!(temp.path().join("prompts").join("keep.md").exists());
    }

    #[test]
    fn test_initialize_reads_root_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "file_ext = \"prompt\"\ndefault_pack = \"work\"\n",
        )
        .unwrap();

        let mut ctx = initialize(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(ctx.config.file_ext(), ".prompt");

        let prompt = ctx
            .api
            .create_prompt(None, "p1", "One", "body", &["ai"])
            .unwrap();
        assert_eq!(prompt.file_path.as_deref(), Some("prompts/work/p1.prompt"));
        assert!(temp.path().join("prompts/work/p1.prompt").exists());
    }

    #[test]
    fn test_initialize_without_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let ctx = initialize(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(ctx.config, StoreConfig::default());
        assert_eq!(ctx.api.store().file_ext(), ".md");
        assert!(temp.path().join("templates").is_dir());
    }
}
