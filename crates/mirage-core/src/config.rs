//! Configuration for a mock session: seeding, route marker, built-in
//! scenario timings and fixture location.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `session.seed`
pub const ENV_SEED: &str = "MIRAGE_SEED";
/// Environment variable overriding `fixtures.directory`
pub const ENV_FIXTURES_DIR: &str = "MIRAGE_FIXTURES_DIR";

/// Complete mock engine configuration.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirageConfig {
    /// Per-session template settings
    pub session: SessionConfig,
    /// Activation route settings
    pub route: RouteConfig,
    /// Built-in scenario settings
    pub builtins: BuiltinConfig,
    /// Fixture discovery settings
    pub fixtures: FixtureConfig,
}

/// Template session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for the session's random source; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Largest row count a `generate` directive may request
    pub max_generate_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_generate_count: 10_000,
        }
    }
}

/// Activation route configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Path segment separating the screen path from test parameters
    pub marker: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            marker: "_test".to_owned(),
        }
    }
}

/// Built-in scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinConfig {
    /// Whether built-in scenarios are pre-registered
    pub enabled: bool,
    /// Delay used by the `slow` scenario
    pub slow_delay_ms: u64,
    /// Delay used by the `very-slow` scenario
    pub very_slow_delay_ms: u64,
    /// Delay used by the `timeout` scenario
    pub timeout_delay_ms: u64,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_delay_ms: 2_000,
            very_slow_delay_ms: 8_000,
            timeout_delay_ms: 30_000,
        }
    }
}

/// Fixture discovery configuration.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Directory scanned recursively for `*.json` fixture documents
    pub directory: Option<PathBuf>,
}

impl MirageConfig {
    /// Load config from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        use mirage_deps::toml::from_str;
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        let config: Self = from_str(&contents)?;

        mirage_deps::tracing::debug!(
            "Loaded config from {:?}: seed={}, marker={:?}",
            path,
            config
                .session
                .seed
                .map_or_else(|| "random".to_owned(), |seed| seed.to_string()),
            config.route.marker
        );

        config.validate()?;
        Ok(config)
    }

    /// Load config from `path` if it exists, otherwise use defaults
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        use mirage_deps::toml::to_string_pretty;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        fs::write(path, format!("# Mirage mock engine configuration\n\n{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Apply `MIRAGE_SEED` and `MIRAGE_FIXTURES_DIR` on top of the loaded values
    ///
    /// # Errors
    /// Returns an error if `MIRAGE_SEED` is not an unsigned integer
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(seed) = env::var(ENV_SEED) {
            let parsed = seed.trim().parse::<u64>().map_err(|error| {
                Error::Config(format!("{ENV_SEED}={seed:?} is not a valid seed: {error}"))
            })?;
            self.session.seed = Some(parsed);
        }
        if let Ok(directory) = env::var(ENV_FIXTURES_DIR) {
            self.fixtures.directory = Some(PathBuf::from(directory));
        }
        Ok(())
    }

    /// Reject values the engine cannot work with
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty or multi-segment route marker
    pub fn validate(&self) -> Result<()> {
        let marker = self.route.marker.as_str();
        if marker.is_empty() || marker.contains('/') {
            return Err(Error::Config(format!(
                "route marker {marker:?} must be a single non-empty path segment"
            )));
        }
        Ok(())
    }
}
