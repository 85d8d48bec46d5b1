//! Core types for the Mirage mock-response engine.
//!
//! This crate provides the error taxonomy, configuration, endpoint keys and
//! the pattern matcher shared by the template processor and the resolution
//! engine.

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

/// Engine configuration loaded from TOML.
pub mod config;
/// Parsed `METHOD /path` endpoint keys.
pub mod endpoint;
/// Error types and result definitions.
pub mod error;
/// Request descriptors and pattern matching.
pub mod matcher;
/// Synthetic responses.
pub mod response;
/// Endpoint selectors for enable/disable toggles.
pub mod selector;
/// Template expansion errors.
pub mod template_error;

pub use config::MirageConfig;
pub use endpoint::{EndpointKey, PathSegment};
pub use error::{Error, Result};
pub use matcher::{ApiRequest, PathParams, matches};
pub use response::{MockResponse, ResponseKind};
pub use selector::EndpointSelector;
pub use template_error::TemplateError;
