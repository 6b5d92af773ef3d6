//! # Search
//!
//! Search runs in two stages over a listing:
//!
//! 1. **Boolean filter**: a parsed [`Expr`] is evaluated against each prompt's
//!    case-folded tags.
//! 2. **Text filter** (optional): a fuzzy match of the text query against the
//!    prompt's id, name and summary. Every character of the query must appear
//!    in order (case-insensitive), gaps allowed, so `cdrv` finds
//!    "Code Review".
//!
//! Searches worth keeping are stored as [`SavedSearch`]es; see
//! [`crate::store::SavedSearchStore`].

use crate::model::Prompt;
use crate::query::Expr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, persisted search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub name: String,
    /// Stored as its canonical query string.
    pub expression: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_query: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavedSearch {
    pub fn new(name: impl Into<String>, expression: Expr) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            expression,
            text_query: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_text_query(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text_query = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    pub fn matches(&self, prompt: &Prompt) -> bool {
        matches_prompt(prompt, Some(&self.expression), self.text_query.as_deref())
    }
}

/// True if every character of `needle` occurs in `haystack` in order,
/// ignoring case and whitespace in the needle. An empty needle matches.
pub fn fuzzy_match(needle: &str, haystack: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let mut remaining = haystack.chars();
    needle
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .all(|wanted| remaining.any(|c| c == wanted))
}

/// Applies the boolean filter, then the text filter. `None` skips a stage.
pub fn matches_prompt(prompt: &Prompt, expr: Option<&Expr>, text: Option<&str>) -> bool {
    if let Some(expr) = expr {
        if !expr.matches(&prompt.tag_set()) {
            return false;
        }
    }
    match text {
        Some(text) if !text.trim().is_empty() => {
            fuzzy_match(text, &prompt.id)
                || fuzzy_match(text, &prompt.name)
                || fuzzy_match(text, &prompt.summary)
        }
        _ => true,
    }
}

pub fn filter_prompts(
    prompts: Vec<Prompt>,
    expr: Option<&Expr>,
    text: Option<&str>,
) -> Vec<Prompt> {
    prompts
        .into_iter()
        .filter(|p| matches_prompt(p, expr, text))
        .collect()
}
