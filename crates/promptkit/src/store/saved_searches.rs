use super::backend::StorageBackend;
use super::SAVED_SEARCHES_PATH;
use crate::error::{PromptError, Result};
use crate::search::SavedSearch;
use crate::validation::check_id;
use chrono::Utc;

/// Named searches, kept as one JSON list at [`SAVED_SEARCHES_PATH`].
///
/// Unlike the metadata cache this file is user data: a corrupt document is
/// reported, not silently replaced.
pub struct SavedSearchStore<'a, B: StorageBackend> {
    backend: &'a B,
}

impl<'a, B: StorageBackend> SavedSearchStore<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// All saved searches, sorted by name.
    pub fn list(&self) -> Result<Vec<SavedSearch>> {
        let Some(raw) = self.backend.read(SAVED_SEARCHES_PATH)? else {
            return Ok(Vec::new());
        };
        let mut searches: Vec<SavedSearch> = serde_json::from_slice(&raw)?;
        searches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(searches)
    }

    pub fn get(&self, name: &str) -> Result<SavedSearch> {
        self.list()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| PromptError::NotFound(format!("saved search '{}'", name)))
    }

    /// Inserts or replaces by name. Replacing keeps the original `created_at`.
    pub fn save(&self, mut search: SavedSearch) -> Result<SavedSearch> {
        check_id(&search.name)?;
        let mut searches = self.list()?;
        let now = Utc::now();

        match searches.iter_mut().find(|s| s.name == search.name) {
            Some(existing) => {
                search.created_at = existing.created_at;
                search.updated_at = now;
                *existing = search.clone();
            }
            None => {
                search.updated_at = now;
                searches.push(search.clone());
            }
        }

        self.write(&mut searches)?;
        Ok(search)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut searches = self.list()?;
        let before = searches.len();
        searches.retain(|s| s.name != name);
        if searches.len() == before {
            return Err(PromptError::NotFound(format!("saved search '{}'", name)));
        }
        self.write(&mut searches)
    }

    fn write(&self, searches: &mut [SavedSearch]) -> Result<()> {
        searches.sort_by(|a, b| a.name.cmp(&b.name));
        let json = serde_json::to_vec_pretty(searches)?;
        self.backend.write_atomic(SAVED_SEARCHES_PATH, &json)
    }
}
