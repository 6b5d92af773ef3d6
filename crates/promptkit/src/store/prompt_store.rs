use super::backend::StorageBackend;
use super::saved_searches::SavedSearchStore;
use super::{ARCHIVE_DIR, DEFAULT_FILE_EXT, PROMPTS_DIR, TEMPLATES_DIR};
use crate::cache::{CacheEntry, Lookup, MetadataCache, CACHE_PATH};
use crate::codec;
use crate::error::{PromptError, Result};
use crate::model::{Prompt, Template};
use crate::validation::{check_id, check_tags};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

pub struct PromptStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    cache: Arc<MetadataCache>,
    file_ext: String,
}

impl<B: StorageBackend> PromptStore<B> {
    /// Opens a store over `backend`, loading the metadata cache if one exists.
    /// An unreadable cache is logged and replaced by an empty one.
    pub fn open(backend: B) -> Self {
        let raw = match backend.read(CACHE_PATH) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("cannot read metadata cache, starting cold: {}", e);
                None
            }
        };
        let cache = MetadataCache::from_bytes(raw.as_deref());
        log::debug!("opened store with {} cached entries", cache.len());
        Self {
            backend,
            cache: Arc::new(cache),
            file_ext: DEFAULT_FILE_EXT.to_string(),
        }
    }

    /// Sets the artifact extension; a missing leading dot is added.
    pub fn with_file_ext(mut self, ext: &str) -> Self {
        let ext = ext.trim();
        if !ext.is_empty() {
            self.file_ext = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{}", ext)
            };
        }
        self
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Shared handle to the metadata cache.
    pub fn cache(&self) -> Arc<MetadataCache> {
        Arc::clone(&self.cache)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn saved_searches(&self) -> SavedSearchStore<'_, B> {
        SavedSearchStore::new(&self.backend)
    }

    /// Where a prompt with this pack and id lives.
    pub fn prompt_path(&self, pack: &str, id: &str) -> String {
        format!("{}/{}/{}{}", PROMPTS_DIR, pack, id, self.file_ext)
    }

    pub fn template_path(&self, id: &str) -> String {
        format!("{}/{}{}", TEMPLATES_DIR, id, self.file_ext)
    }

    fn is_artifact(&self, path: &str) -> bool {
        path.ends_with(&self.file_ext)
    }

    /// Lists every prompt below `dir`, sorted by file path.
    ///
    /// Cache hits come back without a body. Malformed files are skipped with
    /// a warning. A failed cache write-back is logged, not returned.
    pub fn list(&self, dir: &str) -> Result<Vec<Prompt>> {
        let files = self.backend.list_files(dir)?;
        let mut observed = HashSet::new();
        let mut prompts = Vec::new();

        for path in files {
            if !self.is_artifact(&path) {
                continue;
            }
            observed.insert(path.clone());

            let mod_time = match self.backend.modified(&path) {
                Ok(Some(t)) => t,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("skipping {}: {}", path, e);
                    continue;
                }
            };

            if let Lookup::Hit(entry) = self.cache.get(&path, mod_time) {
                prompts.push(entry.to_prompt());
                continue;
            }

            match self.read_prompt(&path) {
                Ok(prompt) => {
                    self.remember(&prompt, &path, mod_time);
                    prompts.push(prompt);
                }
                Err(e) => log::warn!("skipping {}: {}", path, e),
            }
        }

        self.evict_unseen(dir, &observed);
        if let Err(e) = self.flush_cache() {
            log::warn!("cannot write metadata cache: {}", e);
        }

        prompts.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(prompts)
    }

    /// Drops cache entries under `dir` that the walk did not see. Entries
    /// outside `dir` belong to other listings and are kept.
    fn evict_unseen(&self, dir: &str, observed: &HashSet<String>) {
        let dir = dir.trim_matches('/');
        let prefix = format!("{}/", dir);
        let mut keep = observed.clone();
        keep.extend(
            self.cache
                .paths()
                .into_iter()
                .filter(|p| !dir.is_empty() && !p.starts_with(&prefix)),
        );
        let evicted = self.cache.evict(&keep);
        if evicted > 0 {
            log::debug!("evicted {} cache entries under {}", evicted, dir);
        }
    }

    /// Writes the cache back if any entry changed since the last flush.
    pub fn flush_cache(&self) -> Result<()> {
        if !self.cache.take_dirty() {
            return Ok(());
        }
        let result = self
            .cache
            .to_bytes()
            .and_then(|bytes| self.backend.write_atomic(CACHE_PATH, &bytes));
        if result.is_err() {
            self.cache.mark_dirty();
        }
        result
    }

    fn read_prompt(&self, path: &str) -> Result<Prompt> {
        let raw = self
            .backend
            .read(path)?
            .ok_or_else(|| PromptError::NotFound(path.to_string()))?;
        let doc = codec::parse(&raw).map_err(|e| e.at_path(path))?;
        Ok(Prompt::from_document(doc, path, codec::content_hash(&raw)))
    }

    fn remember(&self, prompt: &Prompt, path: &str, mod_time: DateTime<Utc>) {
        let hash = prompt.content_hash.clone().unwrap_or_default();
        self.cache
            .put(path, CacheEntry::from_prompt(prompt, path, mod_time, &hash));
    }

    /// Loads a prompt, body included, from any storage-relative path,
    /// archived copies included.
    pub fn load(&self, path: &str) -> Result<Prompt> {
        self.read_prompt(path)
    }

    pub fn get(&self, pack: &str, id: &str) -> Result<Prompt> {
        check_id(pack)?;
        check_id(id)?;
        self.load(&self.prompt_path(pack, id))
    }

    /// Fills in the body of a prompt that came from a cached listing.
    /// A no-op for prompts that are already complete.
    pub fn hydrate(&self, prompt: &mut Prompt) -> Result<()> {
        if prompt.is_hydrated() {
            return Ok(());
        }
        let path = prompt
            .file_path
            .clone()
            .unwrap_or_else(|| self.prompt_path(&prompt.pack, &prompt.id));
        *prompt = self.load(&path)?;
        Ok(())
    }

    /// Writes `prompt` to `prompts/<pack>/<id><ext>`.
    ///
    /// If a file is already there it is archived first and the version
    /// policy applies. A prompt loaded from somewhere else under `prompts/`
    /// (a hand-written file whose pack or id does not match its location) is
    /// moved: its old file is versioned and archived the same way, then
    /// removed. On success `prompt` carries the saved version, timestamps,
    /// path and hash. On failure it is left untouched.
    pub fn save(&mut self, prompt: &mut Prompt) -> Result<()> {
        if !prompt.is_hydrated() {
            return Err(PromptError::NotHydrated(prompt.id.clone()));
        }
        check_id(&prompt.id)?;
        check_id(&prompt.pack)?;
        check_tags(&prompt.tags)?;

        let path = self.prompt_path(&prompt.pack, &prompt.id);
        let moved_from = self.moved_from(prompt, &path);
        if let Some(old) = &moved_from {
            if self.backend.exists(&path) {
                return Err(PromptError::Store(format!(
                    "cannot move {} to {}: destination already exists",
                    old, path
                )));
            }
        }
        let previous_path = moved_from.clone().unwrap_or_else(|| path.clone());
        let now = Utc::now();
        let mut next = prompt.clone();

        // 1. Archive whatever is there before it gets replaced
        if let Some(previous) = self.backend.read(&previous_path)? {
            match codec::parse(&previous) {
                Ok(doc) => {
                    let stored = Prompt::from_document(doc, &previous_path, String::new());
                    if next.version < stored.version {
                        return Err(PromptError::VersionRegression {
                            id: next.id.clone(),
                            stored: stored.version.to_string(),
                            requested: next.version.to_string(),
                        });
                    }
                    if next.version == stored.version {
                        next.version = stored.version.bump_patch().ok_or_else(|| {
                            PromptError::Store(format!(
                                "version {} of '{}' cannot be bumped further",
                                stored.version, next.id
                            ))
                        })?;
                    }
                    next.created_at = stored.created_at;
                    self.archive(&previous_path, &stored.version.to_string(), &previous)?;
                }
                Err(e) => {
                    log::warn!("{} is malformed, archiving it unparsed: {}", previous_path, e);
                    let label = format!("unparsed-{}", now.format("%Y%m%dT%H%M%S"));
                    self.archive(&previous_path, &label, &previous)?;
                }
            }
        }

        // 2. Write the new version
        next.updated_at = now;
        let text = codec::serialize(&next.to_header(), &next.content)?;
        self.backend.write_atomic(&path, text.as_bytes())?;
        next.file_path = Some(path.clone());
        next.content_hash = Some(codec::content_hash(text.as_bytes()));
        next.hydrated = true;

        // 3. Drop the old location of a moved prompt; its archive copy stays
        if let Some(old) = &moved_from {
            match self.backend.remove(old) {
                Ok(_) => log::debug!("moved {} to {}", old, path),
                Err(e) => log::warn!("saved {} but could not remove {}: {}", path, old, e),
            }
        }

        // 4. Refresh the cache so the next listing does not re-read our own write.
        // The new version is already on disk, so a failure here is not an error.
        match self.backend.modified(&path) {
            Ok(Some(mod_time)) => self.remember(&next, &path, mod_time),
            Ok(None) => {}
            Err(e) => log::warn!("cannot stat {} after saving, cache not updated: {}", path, e),
        }

        *prompt = next;
        Ok(())
    }

    /// The active file a prompt was loaded from, when that is not `path`.
    fn moved_from(&self, prompt: &Prompt, path: &str) -> Option<String> {
        let old = prompt.file_path.as_deref()?;
        let in_prompts = old
            .strip_prefix(PROMPTS_DIR)
            .is_some_and(|rest| rest.starts_with('/'));
        if in_prompts && old != path && self.backend.exists(old) {
            Some(old.to_string())
        } else {
            None
        }
    }

    /// Copies `bytes` to the archive slot for `path`, never overwriting an
    /// earlier archive. Returns the archive path.
    fn archive(&self, path: &str, label: &str, bytes: &[u8]) -> Result<String> {
        let stem = path.strip_suffix(self.file_ext.as_str()).unwrap_or(path);
        let base = format!("{}/{}@{}", ARCHIVE_DIR, stem, label);
        let mut target = format!("{}{}", base, self.file_ext);
        let mut n = 2;
        while self.backend.exists(&target) {
            target = format!("{}-{}{}", base, n, self.file_ext);
            n += 1;
        }
        self.backend.write_atomic(&target, bytes)?;
        log::debug!("archived {} to {}", path, target);
        Ok(target)
    }

    /// Removes the prompt's file. Archived versions stay.
    pub fn delete(&mut self, prompt: &Prompt) -> Result<()> {
        let path = prompt
            .file_path
            .clone()
            .unwrap_or_else(|| self.prompt_path(&prompt.pack, &prompt.id));
        if !self.backend.remove(&path)? {
            return Err(PromptError::NotFound(path));
        }
        Ok(())
    }

    /// Archived versions of `prompt`, oldest first.
    pub fn history(&self, prompt: &Prompt) -> Result<Vec<Prompt>> {
        let dir = format!("{}/{}/{}", ARCHIVE_DIR, PROMPTS_DIR, prompt.pack);
        let marker = format!("{}@", prompt.id);
        let mut versions: Vec<Prompt> = self
            .list(&dir)?
            .into_iter()
            .filter(|p| {
                p.file_path
                    .as_deref()
                    .and_then(|path| path.rsplit('/').next())
                    .is_some_and(|name| name.starts_with(&marker))
            })
            .collect();
        versions.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        Ok(versions)
    }

    // --- Templates ---

    /// All templates, sorted by path. Malformed files are skipped with a warning.
    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let mut templates = Vec::new();
        for path in self.backend.list_files(TEMPLATES_DIR)? {
            if !self.is_artifact(&path) {
                continue;
            }
            match self.load_template(&path) {
                Ok(template) => templates.push(template),
                Err(e) => log::warn!("skipping {}: {}", path, e),
            }
        }
        Ok(templates)
    }

    pub fn load_template(&self, path: &str) -> Result<Template> {
        let raw = self
            .backend
            .read(path)?
            .ok_or_else(|| PromptError::NotFound(path.to_string()))?;
        let doc = codec::parse(&raw).map_err(|e| e.at_path(path))?;
        Ok(Template::from_document(doc, path))
    }

    pub fn get_template(&self, id: &str) -> Result<Template> {
        check_id(id)?;
        self.load_template(&self.template_path(id))
    }

    /// Writes a template in place. Templates are not archived; `created_at`
    /// is carried over from the file being replaced.
    pub fn save_template(&mut self, template: &mut Template) -> Result<()> {
        check_id(&template.id)?;
        let path = self.template_path(&template.id);
        let mut next = template.clone();

        if let Some(previous) = self.backend.read(&path)? {
            if let Ok(doc) = codec::parse(&previous) {
                next.created_at = Template::from_document(doc, &path).created_at;
            }
        }
        next.updated_at = Utc::now();

        let text = codec::serialize(&next.to_header(), &next.content)?;
        self.backend.write_atomic(&path, text.as_bytes())?;
        next.file_path = Some(path);
        *template = next;
        Ok(())
    }

    pub fn delete_template(&mut self, id: &str) -> Result<()> {
        check_id(id)?;
        let path = self.template_path(id);
        if !self.backend.remove(&path)? {
            return Err(PromptError::NotFound(path));
        }
        Ok(())
    }
}
