//! Mock-response resolution engine.
//!
//! Decides, for each intercepted API call, whether to answer with a synthetic
//! response and which one:
//! - [`route`] turns activation URLs into a [`TestRouteConfig`]
//! - [`registry`] holds validated scenarios
//! - [`fixture`] validates fixture documents and turns them into scenarios
//! - [`resolver`] walks the gate and the override / scenario / pass-through tiers
//! - [`controller`] owns the copy-on-write snapshot and exposes the mutations

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

/// Built-in scenarios.
pub mod builtins;
/// Controller surface and snapshot management.
pub mod controller;
/// Fixture documents and sources.
pub mod fixture;
/// Persisted toggle preferences.
pub mod preferences;
/// Scenario definitions and the registry.
pub mod registry;
/// Per-request resolution.
pub mod resolver;
/// Activation route parsing and building.
pub mod route;
/// Engine state and toggle policy.
pub mod state;

pub use controller::MockController;
pub use fixture::{DirectoryFixtureSource, FixtureCatalog, FixtureSource};
pub use preferences::{MemoryPreferenceStore, PreferenceStore};
pub use registry::{Scenario, ScenarioDefinition, ScenarioRegistry};
pub use resolver::{Decision, Resolution, ResolutionSource, resolve};
pub use route::{MockDirectives, MockMode, RouteParser, TestRouteConfig};
pub use state::{EngineState, TogglePolicy};
