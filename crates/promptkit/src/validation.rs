//! Identifier and tag validation.
//!
//! Ids and pack names become path components (`prompts/<pack>/<id>.md`), so they
//! are restricted to a filesystem-safe alphabet:
//! - Alphanumeric characters, underscores (`_`), hyphens (`-`) and dots (`.`)
//! - Cannot start with a dot (hidden files are skipped by listings)
//!
//! Tags must survive the query language round trip:
//! - No whitespace and no parentheses
//! - Cannot be one of the keywords `AND`, `OR`, `NOT` (any case)

use crate::error::PromptError;

/// Validates an artifact id or pack name.
///
/// # Examples
/// ```
/// use promptkit::validation::validate_id;
///
/// assert!(validate_id("code-review").is_ok());
/// assert!(validate_id("summarize_v2.short").is_ok());
///
/// assert!(validate_id("").is_err());
/// assert!(validate_id(".hidden").is_err());
/// assert!(validate_id("../escape").is_err());
/// assert!(validate_id("a/b").is_err());
/// ```
pub fn validate_id(id: &str) -> Result<(), IdValidationError> {
    let Some(first) = id.chars().next() else {
        return Err(IdValidationError::Empty);
    };
    if first == '.' {
        return Err(IdValidationError::LeadingDot);
    }
    for ch in id.chars() {
        if !is_valid_id_char(ch) {
            return Err(IdValidationError::InvalidCharacter(ch));
        }
    }
    Ok(())
}

/// Validates a tag so that it can be written back as a query literal.
pub fn validate_tag(tag: &str) -> Result<(), TagValidationError> {
    if tag.trim().is_empty() {
        return Err(TagValidationError::Empty);
    }
    if let Some(ch) = tag.chars().find(|c| c.is_whitespace() || *c == '(' || *c == ')') {
        return Err(TagValidationError::InvalidCharacter(ch));
    }
    if crate::query::lexer::is_keyword(tag) {
        return Err(TagValidationError::Keyword(tag.to_string()));
    }
    Ok(())
}

pub(crate) fn check_id(id: &str) -> crate::error::Result<()> {
    validate_id(id).map_err(|e| PromptError::InvalidId {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn check_tags(tags: &[String]) -> crate::error::Result<()> {
    for tag in tags {
        validate_tag(tag).map_err(|e| PromptError::InvalidTag {
            tag: tag.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn is_valid_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.'
}

/// Error type for id validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdValidationError {
    Empty,
    /// Dot-prefixed names are reserved for hidden and temporary files
    LeadingDot,
    InvalidCharacter(char),
}

impl std::fmt::Display for IdValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdValidationError::Empty => write!(f, "id cannot be empty"),
            IdValidationError::LeadingDot => write!(f, "id cannot start with a dot"),
            IdValidationError::InvalidCharacter(ch) => write!(
                f,
                "id contains invalid character '{}' (only alphanumeric, underscore, hyphen and dot allowed)",
                ch
            ),
        }
    }
}

impl std::error::Error for IdValidationError {}

/// Error type for tag validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    Empty,
    InvalidCharacter(char),
    /// The tag collides with a query keyword
    Keyword(String),
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag cannot be empty"),
            TagValidationError::InvalidCharacter(ch) => {
                write!(f, "tag contains invalid character {:?}", ch)
            }
            TagValidationError::Keyword(k) => {
                write!(f, "tag '{}' is reserved as a query keyword", k)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(validate_id("p1").is_ok());
        assert!(validate_id("code-review").is_ok());
        assert!(validate_id("my_prompt").is_ok());
        assert!(validate_id("v1.2").is_ok());
    }

    #[test]
    fn test_invalid_empty_id() {
        assert_eq!(validate_id(""), Err(IdValidationError::Empty));
    }

    #[test]
    fn test_invalid_leading_dot() {
        assert_eq!(validate_id(".cache"), Err(IdValidationError::LeadingDot));
        assert_eq!(validate_id(".."), Err(IdValidationError::LeadingDot));
    }

    #[test]
    fn test_invalid_path_separators() {
        assert_eq!(
            validate_id("a/b"),
            Err(IdValidationError::InvalidCharacter('/'))
        );
        assert_eq!(
            validate_id("a\\b"),
            Err(IdValidationError::InvalidCharacter('\\'))
        );
        assert_eq!(
            validate_id("has space"),
            Err(IdValidationError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_valid_tags() {
        assert!(validate_tag("ai").is_ok());
        assert!(validate_tag("Machine-Learning").is_ok());
        assert!(validate_tag("android").is_ok());
        assert!(validate_tag("c++").is_ok());
    }

    #[test]
    fn test_invalid_tags() {
        assert_eq!(validate_tag("  "), Err(TagValidationError::Empty));
        assert_eq!(
            validate_tag("two words"),
            Err(TagValidationError::InvalidCharacter(' '))
        );
        assert_eq!(
            validate_tag("f(x)"),
            Err(TagValidationError::InvalidCharacter('('))
        );
        assert_eq!(
            validate_tag("Not"),
            Err(TagValidationError::Keyword("Not".to_string()))
        );
    }

    #[test]
    fn test_check_id_maps_to_prompt_error() {
        let err = check_id("bad id").unwrap_err();
        assert!(matches!(err, PromptError::InvalidId { .. }));
    }
}
