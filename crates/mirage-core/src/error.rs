use core::result::Result as CoreResult;
use std::io::Error as IoError;

use mirage_deps::serde_json::Error as SerdeJsonError;
use mirage_deps::toml::de::Error as TomlError;
use thiserror::Error;

use crate::template_error::TemplateError;

/// Result type for mock resolution operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while registering, activating or resolving mocks.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A scenario definition or fixture document was rejected at registration time.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An endpoint key's path template is structurally invalid.
    #[error("Invalid endpoint pattern {endpoint:?}: {reason}")]
    Pattern {
        /// The endpoint key as written
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// A scenario id was activated that the registry does not know.
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// A response template could not be expanded.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was raised while validating definitions.
    ///
    /// Pattern errors count: they surface through registry validation.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Pattern { .. })
    }

    /// Whether this error came out of template expansion during resolution.
    pub fn is_template_error(&self) -> bool {
        matches!(self, Self::Template(_))
    }
}
