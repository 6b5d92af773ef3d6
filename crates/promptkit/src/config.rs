//! # Configuration
//!
//! Store configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files and environment variables.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `PROMPTKIT__FILE_EXT`, `PROMPTKIT__DEFAULT_PACK`.
//! 2. **Root Config**: `promptkit.toml` in the storage root.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `file_ext` | `.md` | Extension of prompt and template files |
//! | `default_pack` | `personal` | Pack used for new prompts that name none |

use crate::model::DEFAULT_PACK;
use crate::store::DEFAULT_FILE_EXT;
use confique::Config;
use serde::{Deserialize, Serialize};

/// Configuration for a storage root, stored in `promptkit.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Extension of artifact files (e.g. ".md", ".prompt")
    #[config(default = ".md")]
    pub file_ext: String,

    /// Pack for prompts created without one
    #[config(default = "personal")]
    pub default_pack: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_ext: DEFAULT_FILE_EXT.to_string(),
            default_pack: DEFAULT_PACK.to_string(),
        }
    }
}

impl StoreConfig {
    /// Get the file extension, normalized to start with a dot.
    pub fn file_ext(&self) -> String {
        let ext = self.file_ext.trim();
        if ext.is_empty() {
            DEFAULT_FILE_EXT.to_string()
        } else if ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        }
    }

    /// The configured default pack, or `personal` if left blank.
    pub fn default_pack(&self) -> String {
        let pack = self.default_pack.trim();
        if pack.is_empty() {
            DEFAULT_PACK.to_string()
        } else {
            pack.to_string()
        }
    }
}
