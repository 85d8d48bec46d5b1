//! Error types for template expansion.

use thiserror::Error;

/// Errors raised while expanding placeholders and `generate` directives.
///
/// These surface out of resolution rather than degrading to the literal
/// template text, so a broken fixture fails loudly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The placeholder names a generator outside the catalogue
    #[error("unknown generator `{0}`")]
    UnknownGenerator(String),

    /// A `{{` was not closed or the expression inside it is not a generator call
    #[error("malformed placeholder in {0:?}")]
    MalformedPlaceholder(String),

    /// The generator exists but its arguments do not fit
    #[error("invalid arguments for `{generator}`: {reason}")]
    InvalidArguments {
        /// Generator name as written in the placeholder
        generator: String,
        /// What was wrong with the arguments
        reason: String,
    },

    /// A `generate` directive is missing `count`/`template` or has the wrong types
    #[error("malformed generate directive: {0}")]
    MalformedDirective(String),

    /// A `generate` directive asked for more rows than the session allows
    #[error("generate count {requested} exceeds limit {limit}")]
    GenerateLimitExceeded {
        /// Requested row count
        requested: u64,
        /// Configured maximum
        limit: usize,
    },
}
