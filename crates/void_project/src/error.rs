//! Error types for project export and import

use thiserror::Error;
use void_scene::CodecError;

/// Project errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Document text is not a valid project document
    #[error("Malformed project document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// Document could not be written
    #[error("Failed to serialize project document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// An entity codec failed while exporting
    #[error("Failed to encode {entity} '{name}': {source}")]
    Codec {
        entity: &'static str,
        name: String,
        #[source]
        source: CodecError,
    },

    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::ProjectConfig`]
    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;
