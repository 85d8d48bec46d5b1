//! Shared dependency re-exports for the Mirage workspace.
//!
//! Member crates reach third-party libraries through this crate so every
//! crate links the same versions. Crates needing derive macros (`serde`,
//! `thiserror`, `clap`) still depend on those directly.

pub use anyhow;
pub use chrono;
pub use rand;
pub use regex;
pub use serde_json;
pub use tempfile;
pub use toml;
pub use tracing;
pub use tracing_subscriber;
pub use url;
pub use uuid;
