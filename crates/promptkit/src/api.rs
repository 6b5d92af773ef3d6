//! # API Facade
//!
//! The API layer is a **thin facade** over [`PromptStore`]. It is the single
//! entry point for prompt, template and search operations, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Fills in defaults** (the configured default pack)
//! - **Parses queries** through the one shared parser, [`crate::query::parse`]
//! - **Returns structured types**, never formatted output
//!
//! ## What the API Does NOT Do
//!
//! - **Storage policy**: archival, caching and versioning live in the store
//! - **I/O to the user**: no stdout, stderr or formatting
//!
//! ## Generic Over StorageBackend
//!
//! `PromptApi<B: StorageBackend>` works the same over both backends:
//! - Production: `PromptApi<FsBackend>`
//! - Testing: `PromptApi<MemBackend>`

use crate::config::StoreConfig;
use crate::error::{PromptError, Result};
use crate::model::{Prompt, Template};
use crate::query::{self, Expr};
use crate::search::{filter_prompts, SavedSearch};
use crate::store::{PromptStore, StorageBackend, PROMPTS_DIR};
use std::collections::HashMap;

/// The main API facade for prompt operations.
pub struct PromptApi<B: StorageBackend> {
    store: PromptStore<B>,
    config: StoreConfig,
}

impl<B: StorageBackend> PromptApi<B> {
    pub fn new(store: PromptStore<B>, config: StoreConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &PromptStore<B> {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn pack_or_default(&self, pack: Option<&str>) -> String {
        pack.map(str::to_string)
            .unwrap_or_else(|| self.config.default_pack())
    }

    // --- Prompts ---

    /// Every active prompt across all packs. Bodies may be empty; see
    /// [`PromptApi::hydrate`].
    pub fn list_prompts(&self) -> Result<Vec<Prompt>> {
        self.store.list(PROMPTS_DIR)
    }

    pub fn list_pack(&self, pack: &str) -> Result<Vec<Prompt>> {
        self.store.list(&format!("{}/{}", PROMPTS_DIR, pack))
    }

    pub fn get_prompt(&self, pack: Option<&str>, id: &str) -> Result<Prompt> {
        self.store.get(&self.pack_or_default(pack), id)
    }

    pub fn hydrate(&self, prompt: &mut Prompt) -> Result<()> {
        self.store.hydrate(prompt)
    }

    /// Creates a new prompt at version 1.0.0. Fails if the id is taken in
    /// that pack.
    pub fn create_prompt(
        &mut self,
        pack: Option<&str>,
        id: &str,
        name: &str,
        content: &str,
        tags: &[&str],
    ) -> Result<Prompt> {
        let pack = self.pack_or_default(pack);
        let path = self.store.prompt_path(&pack, id);
        if self.store.backend().exists(&path) {
            return Err(PromptError::Store(format!(
                "prompt '{}' already exists in pack '{}'",
                id, pack
            )));
        }
        let mut prompt = Prompt::new(id, name, content)
            .with_pack(pack)
            .with_tags(tags.iter().copied());
        self.store.save(&mut prompt)?;
        Ok(prompt)
    }

    /// Saves an edited prompt; the previous version is archived.
    pub fn update_prompt(&mut self, prompt: &mut Prompt) -> Result<()> {
        self.store.save(prompt)
    }

    pub fn delete_prompt(&mut self, pack: Option<&str>, id: &str) -> Result<()> {
        let prompt = self.get_prompt(pack, id)?;
        self.store.delete(&prompt)
    }

    pub fn history(&self, pack: Option<&str>, id: &str) -> Result<Vec<Prompt>> {
        let prompt = self.get_prompt(pack, id)?;
        self.store.history(&prompt)
    }

    // --- Search ---

    /// Active prompts matching `query`, narrowed by an optional fuzzy text
    /// query against id, name and summary.
    pub fn search(&self, query: &str, text_query: Option<&str>) -> Result<Vec<Prompt>> {
        let expr = query::parse(query)?;
        self.search_expr(&expr, text_query)
    }

    pub fn search_expr(&self, expr: &Expr, text_query: Option<&str>) -> Result<Vec<Prompt>> {
        Ok(filter_prompts(self.list_prompts()?, Some(expr), text_query))
    }

    /// Parses `query` and stores it under `name`, replacing any search of
    /// the same name.
    pub fn save_search(
        &self,
        name: &str,
        query: &str,
        text_query: Option<&str>,
    ) -> Result<SavedSearch> {
        let expr = query::parse(query)?;
        let mut search = SavedSearch::new(name, expr);
        if let Some(text) = text_query {
            search = search.with_text_query(text);
        }
        self.store.saved_searches().save(search)
    }

    pub fn saved_searches(&self) -> Result<Vec<SavedSearch>> {
        self.store.saved_searches().list()
    }

    pub fn run_saved_search(&self, name: &str) -> Result<Vec<Prompt>> {
        let search = self.store.saved_searches().get(name)?;
        self.search_expr(&search.expression, search.text_query.as_deref())
    }

    pub fn delete_search(&self, name: &str) -> Result<()> {
        self.store.saved_searches().delete(name)
    }

    // --- Templates ---

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        self.store.list_templates()
    }

    pub fn get_template(&self, id: &str) -> Result<Template> {
        self.store.get_template(id)
    }

    pub fn save_template(&mut self, template: &mut Template) -> Result<()> {
        self.store.save_template(template)
    }

    pub fn delete_template(&mut self, id: &str) -> Result<()> {
        self.store.delete_template(id)
    }

    pub fn render_template(&self, id: &str, values: &HashMap<String, String>) -> Result<String> {
        self.get_template(id)?.render(values)
    }
}
