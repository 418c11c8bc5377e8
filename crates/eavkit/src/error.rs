use thiserror::Error;

#[derive(Error, Debug)]
pub enum EavError {
    /// The metadata store could not produce the definitions for an entity type.
    /// Never cached; the next `get` queries the store again.
    #[error("Attribute metadata unavailable for '{entity_type}': {reason}")]
    MetadataUnavailable { entity_type: String, reason: String },

    #[error("Attribute '{code}' declares unrecognized data type '{data_type}'")]
    InvalidDataType { code: String, data_type: String },

    /// An immediate write failed. The binding keeps its pending value.
    #[error("Failed to persist attribute '{code}': {reason}")]
    PersistenceFailure { code: String, reason: String },

    #[error("Attribute '{code}' expects {expected}, got {found}")]
    TypeMismatch {
        code: String,
        expected: String,
        found: String,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EavError {
    /// Wrap a lower-level store error raised while writing `code`.
    pub fn persistence(code: &str, source: EavError) -> Self {
        match source {
            already @ EavError::PersistenceFailure { .. } => already,
            other => EavError::PersistenceFailure {
                code: code.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Wrap a lower-level store error raised while fetching definitions.
    pub fn metadata(entity_type: &str, source: EavError) -> Self {
        match source {
            already @ EavError::MetadataUnavailable { .. } => already,
            other => EavError::MetadataUnavailable {
                entity_type: entity_type.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, EavError>;
