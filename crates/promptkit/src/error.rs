use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    /// The artifact bytes could not be decoded (missing delimiters, bad YAML, bad UTF-8).
    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),

    /// A boolean query failed to parse. `position` is a byte offset into the query.
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Version {requested} of '{id}' is lower than stored version {stored}")]
    VersionRegression {
        id: String,
        stored: String,
        requested: String,
    },

    /// A lazily listed prompt was passed to `save` without its body loaded.
    #[error("Prompt '{0}' was listed from cache; hydrate it before saving")]
    NotHydrated(String),

    #[error("Template '{template}' requires a value for slot '{slot}'")]
    MissingSlot { template: String, slot: String },

    #[error("Store error: {0}")]
    Store(String),
}

impl PromptError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        PromptError::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Prefixes a codec failure with the path it was read from.
    pub(crate) fn at_path(self, path: &str) -> Self {
        match self {
            PromptError::MalformedArtifact(reason) => {
                PromptError::MalformedArtifact(format!("{}: {}", path, reason))
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;
