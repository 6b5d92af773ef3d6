//! # Promptkit Architecture
//!
//! Promptkit is a **file-backed prompt library**. Prompts and templates are
//! plain text files with a YAML header that a user can open in any editor;
//! the library adds listing, versioned edits and tag search on top without
//! ever making the files depend on it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade: defaults, query parsing, search             │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store Layer (store/prompt_store.rs)                        │
//! │  - Cached listing, archival on edit, version policy         │
//! │  - Templates and saved searches                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Backend Layer (store/backend.rs)                           │
//! │  - Raw I/O behind the StorageBackend trait                  │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Beside the layers sit the pure parts: the artifact [`codec`], the
//! [`query`] language and the [`cache`] structure. None of them do I/O.
//!
//! ## Key Principle: Files Are Truth
//!
//! The directory is the single source of truth. The metadata cache is an
//! optimization that is discarded the moment it disagrees with a file's
//! modification time, and a corrupt cache is simply rebuilt.
//!
//! ## No I/O Assumptions in Core
//!
//! Nothing in this crate writes to stdout/stderr or exits the process.
//! Diagnostics go through the `log` facade; the embedding application picks
//! the logger.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`store`]: Storage backends and the policy store
//! - [`cache`]: Metadata cache with exact-mtime validity
//! - [`codec`]: Artifact file format (YAML header + body)
//! - [`query`]: Tag query lexer, parser, evaluator and renderer
//! - [`search`]: Saved searches and fuzzy text matching
//! - [`model`]: Core data types (`Prompt`, `Template`, `Version`)
//! - [`validation`]: Id and tag rules
//! - [`config`]: Configuration management
//! - [`init`]: Storage root resolution and layout
//! - [`error`]: Error types

pub mod api;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod query;
pub mod search;
pub mod store;
pub mod validation;

#[cfg(test)]
pub mod test_utils;
