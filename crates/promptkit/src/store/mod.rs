//! # Storage Layer
//!
//! A storage root is a plain directory tree of text artifacts. The
//! [`StorageBackend`] trait does raw I/O; [`PromptStore`] layers the policy on
//! top: metadata caching, archival, version bumps, validation.
//!
//! ## Files Are Truth
//!
//! - **Truth**: the artifact files. Editing one by hand is a supported workflow.
//! - **Cache**: `.cache/metadata`, decoded metadata keyed by path, trusted only
//!   while the file's modification time matches exactly. See [`crate::cache`].
//!
//! ## Listing
//!
//! `list(dir)` walks `dir` recursively:
//!
//! 1. **Cache hit**: the prompt comes back from cached metadata, body empty,
//!    `is_hydrated() == false`. Call [`PromptStore::hydrate`] for the body.
//! 2. **Miss or stale**: the file is read and parsed, the cache refreshed.
//! 3. **Malformed**: skipped with a warning. One bad file never hides the rest.
//! 4. **Eviction**: entries under `dir` whose files were not seen are dropped,
//!    and the cache is written back if anything changed.
//!
//! ## Archival
//!
//! Saving over an existing prompt first copies the previous bytes, unchanged,
//! to `archive/<path without ext>@<previous version><ext>`. The new version is
//! the caller's if higher, the stored one with the patch bumped if equal, and
//! an error if lower.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! ├── promptkit.toml                        # Optional configuration
//! ├── saved_searches                        # Saved searches (JSON list)
//! ├── .cache/metadata                       # Metadata cache (JSON)
//! ├── prompts/<pack>/<id>.md                # Active prompts
//! ├── templates/<id>.md                     # Templates
//! └── archive/prompts/<pack>/<id>@1.0.0.md  # Superseded prompt versions
//! ```

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod prompt_store;
pub mod saved_searches;

pub use backend::StorageBackend;
pub use prompt_store::PromptStore;
pub use saved_searches::SavedSearchStore;

pub const PROMPTS_DIR: &str = "prompts";
pub const TEMPLATES_DIR: &str = "templates";
pub const ARCHIVE_DIR: &str = "archive";
pub const SAVED_SEARCHES_PATH: &str = "saved_searches";

/// Extension used when none is configured.
pub const DEFAULT_FILE_EXT: &str = ".md";
