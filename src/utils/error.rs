use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("State file error: {0}")]
    StateFileError(#[from] toml::de::Error),

    /// Remote said no: the API envelope carried `type = "error"`.
    #[error("Purelymail API error [{code}]: {message}")]
    ApiError { code: String, message: String },

    #[error("Validation error on `{field}`: {reason}")]
    ValidationError { field: String, reason: String },

    #[error(
        "Unknown preset `{name}`, expected one of: \
         any_address, catchall_except_valid, prefix_match, exact_match"
    )]
    UnknownPresetError { name: String },

    #[error("rule #{index}: no preset given and at least one of match_user, prefix, catchall is missing")]
    IncompleteRuleError { index: usize },

    #[error("rule #{index}: does not match any known preset")]
    UnrecognizedPatternError { index: usize },

    #[error(
        "rule #{index}: only one `any_address` or `catchall_except_valid` \
         rule is allowed per domain ({domain})"
    )]
    DuplicateCatchAllError { index: usize, domain: String },

    #[error("rule #{index}: `exact_match` with an empty match_user matches every address, refusing")]
    InvalidExactMatchError { index: usize },

    #[error("{kind} `{name}` does not exist")]
    DoesNotExist { kind: &'static str, name: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The remote returned something our model says it never should
    /// (shared domains in an unshared listing, a listed rule without an id).
    #[error("Inconsistent API response: {message}")]
    InconsistentResponse { message: String },
}

impl SyncError {
    /// Prefix a validation error's field with the collection entry it
    /// came from, e.g. `users[2].email`.
    pub fn at_index(self, collection: &str, index: usize) -> SyncError {
        match self {
            SyncError::ValidationError { field, reason } => SyncError::ValidationError {
                field: format!("{}[{}].{}", collection, index, field),
                reason,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
