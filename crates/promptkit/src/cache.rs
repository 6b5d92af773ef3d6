//! # Metadata Cache
//!
//! Listing a collection should not mean parsing every file in it. The cache
//! keeps the decoded metadata of each prompt, keyed by storage-relative path,
//! together with a fingerprint of the file it came from.
//!
//! ## Files Are Truth
//!
//! The cache is advisory. Whenever it disagrees with the disk, the disk wins:
//!
//! - **Validity**: an entry is only served if its recorded `mod_time` is
//!   *exactly* the file's current modification time. Newer, older, truncated
//!   to the second: all count as stale.
//! - **Hash**: `file_hash` (SHA-256 of the bytes) is recorded for diagnostics.
//!   It is not part of the validity check; hashing every file on every listing
//!   is the cost the cache exists to avoid.
//! - **Bodies**: never cached. Entries hold metadata only, bodies are read on
//!   demand.
//! - **Corruption**: an unreadable cache document loads as an empty cache and
//!   the next listing rebuilds it.
//!
//! ## Persistence
//!
//! One JSON document per storage root at [`CACHE_PATH`]. The store loads it
//! once when it opens and writes it back after a listing only if an entry was
//! added, changed or evicted ([`MetadataCache::take_dirty`]).
//!
//! ## Sharing
//!
//! The map sits behind one `RwLock`: lookups share the read lock, `put` and
//! `evict` take the write lock. Hand out the cache as `Arc<MetadataCache>` to
//! run a listing and a background refresh on different threads.

use crate::error::Result;
use crate::model::{Prompt, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Storage-relative location of the cache document.
pub const CACHE_PATH: &str = ".cache/metadata";

/// Bumped when `CacheEntry` changes shape; older documents are discarded.
const CACHE_FORMAT: u32 = 1;

/// Denormalized prompt metadata plus the fingerprint of its source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub file_path: String,
    pub mod_time: DateTime<Utc>,
    pub file_hash: String,
    pub id: String,
    pub version: Version,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub template_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pack: String,
}

impl CacheEntry {
    pub fn from_prompt(
        prompt: &Prompt,
        file_path: &str,
        mod_time: DateTime<Utc>,
        file_hash: &str,
    ) -> Self {
        Self {
            file_path: file_path.to_string(),
            mod_time,
            file_hash: file_hash.to_string(),
            id: prompt.id.clone(),
            version: prompt.version,
            name: prompt.name.clone(),
            summary: prompt.summary.clone(),
            tags: prompt.tags.clone(),
            template_ref: prompt.template_ref.clone(),
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
            pack: prompt.pack.clone(),
        }
    }

    /// A body-less prompt; `is_hydrated()` is false until the store loads the body.
    pub fn to_prompt(&self) -> Prompt {
        Prompt {
            id: self.id.clone(),
            version: self.version,
            name: self.name.clone(),
            summary: self.summary.clone(),
            tags: self.tags.clone(),
            template_ref: self.template_ref.clone(),
            content: String::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            file_path: Some(self.file_path.clone()),
            content_hash: Some(self.file_hash.clone()),
            pack: self.pack.clone(),
            extra: serde_yaml::Mapping::new(),
            hydrated: false,
        }
    }
}

/// Outcome of [`MetadataCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Fingerprint matches; the entry can be served.
    Hit(CacheEntry),
    /// An entry exists but the file changed since it was recorded.
    Stale(CacheEntry),
    Miss,
}

impl Lookup {
    pub fn is_valid(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

#[derive(Serialize, Deserialize)]
struct CacheDocument {
    format: u32,
    entries: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    dirty: AtomicBool,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a persisted cache document. Missing, corrupt or outdated data
    /// yields an empty cache; the caller never sees an error.
    pub fn from_bytes(raw: Option<&[u8]>) -> Self {
        let Some(raw) = raw else {
            return Self::new();
        };
        match serde_json::from_slice::<CacheDocument>(raw) {
            Ok(doc) if doc.format == CACHE_FORMAT => Self {
                entries: RwLock::new(doc.entries.into_iter().collect()),
                dirty: AtomicBool::new(false),
            },
            Ok(doc) => {
                log::debug!(
                    "discarding metadata cache in format {} (expected {})",
                    doc.format,
                    CACHE_FORMAT
                );
                Self::new()
            }
            Err(e) => {
                log::warn!("metadata cache is corrupt, rebuilding: {}", e);
                Self::new()
            }
        }
    }

    /// Encodes the cache as a JSON document with stable key order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let doc = CacheDocument {
            format: CACHE_FORMAT,
            entries: entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    /// Looks up `path` and checks it against the file's current modification time.
    pub fn get(&self, path: &str, current_mod_time: DateTime<Utc>) -> Lookup {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(entry) if entry.mod_time == current_mod_time => Lookup::Hit(entry.clone()),
            Some(entry) => Lookup::Stale(entry.clone()),
            None => Lookup::Miss,
        }
    }

    pub fn put(&self, path: &str, entry: CacheEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(path) != Some(&entry) {
            entries.insert(path.to_string(), entry);
            self.dirty.store(true, Ordering::Release);
        }
    }

    /// Drops every entry whose path is not in `keep`. Returns how many went.
    pub fn evict(&self, keep: &HashSet<String>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|path, _| keep.contains(path));
        let removed = before - entries.len();
        if removed > 0 {
            self.dirty.store(true, Ordering::Release);
        }
        removed
    }

    pub fn paths(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clears the dirty flag, returning whether it was set. A failed write
    /// should call [`MetadataCache::mark_dirty`] to retry on the next flush.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}
