//! Template expansion for fixture responses.
//!
//! Placeholders such as `{{person.fullName}}` are replaced with generated
//! values, and `{"generate": {"count": N, "template": T}}` directives expand
//! into arrays. All randomness flows through one seeded [`SessionRng`] per
//! processor so a session can be replayed from its seed.

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

/// The generator catalogue.
pub mod generators;
/// Placeholder parsing.
pub mod placeholder;
/// Recursive template expansion.
pub mod processor;
/// Seeded session random source.
pub mod rng;

pub use generators::Generator;
pub use processor::TemplateProcessor;
pub use rng::SessionRng;
