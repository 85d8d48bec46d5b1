//! The controller surface the interception layer talks to.
//!
//! The controller owns the current snapshot of registry and state. Readers
//! clone the snapshot `Arc` and resolve without holding the lock; writers
//! build a complete new snapshot and swap it in, so a concurrent `resolve`
//! sees either all of a mutation or none of it.

use crate::builtins::builtin_scenarios;
use crate::fixture::{BASE_SCENARIO_ID, FixtureCatalog, FixtureSource};
use crate::preferences::{PreferenceStore, TOGGLES_PREFERENCE_KEY, TogglePreferences};
use crate::registry::{Scenario, ScenarioDefinition, ScenarioRegistry};
use crate::resolver::{self, Resolution};
use crate::route::{MockMode, RouteParser, TestRouteConfig};
use crate::state::{EngineState, TogglePolicy};
use mirage_core::config::SessionConfig;
use mirage_core::{
    ApiRequest, EndpointKey, EndpointSelector, Error, MirageConfig, ResponseKind, Result,
};
use mirage_deps::serde_json;
use mirage_deps::tracing;
use mirage_template::TemplateProcessor;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct EngineSnapshot {
    registry: Arc<ScenarioRegistry>,
    state: EngineState,
}

fn lock_error(err: impl Display) -> Error {
    Error::Other(format!("Lock poisoned: {err}"))
}

/// Owns the engine state for one test session.
#[derive(Debug)]
pub struct MockController {
    snapshot: RwLock<Arc<EngineSnapshot>>,
    processor: TemplateProcessor,
    routes: RouteParser,
}

impl MockController {
    /// Controller with built-in scenarios registered (unless disabled).
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    pub fn new(config: &MirageConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = ScenarioRegistry::new();
        if config.builtins.enabled {
            for definition in builtin_scenarios(&config.builtins) {
                registry.register(definition)?;
            }
        }

        let processor = TemplateProcessor::new(&config.session);
        tracing::info!(
            "Mock session started with seed {} and {} scenarios",
            processor.seed(),
            registry.len()
        );

        Ok(Self {
            snapshot: RwLock::new(Arc::new(EngineSnapshot {
                registry: Arc::new(registry),
                state: EngineState::new(),
            })),
            processor,
            routes: RouteParser::new(&config.route),
        })
    }

    /// Controller with default configuration and a fixed seed
    ///
    /// # Errors
    /// Returns an error if the built-in scenarios fail to register
    pub fn with_seed(seed: u64) -> Result<Self> {
        Self::new(&MirageConfig {
            session: SessionConfig {
                seed: Some(seed),
                ..SessionConfig::default()
            },
            ..MirageConfig::default()
        })
    }

    /// Seed of the session's template random source
    pub fn seed(&self) -> u64 {
        self.processor.seed()
    }

    /// Route parser using the configured marker
    pub fn routes(&self) -> &RouteParser {
        &self.routes
    }

    fn current(&self) -> Result<Arc<EngineSnapshot>> {
        self.snapshot
            .read()
            .map(|snapshot| Arc::clone(&*snapshot))
            .map_err(lock_error)
    }

    fn update<T>(&self, mutate: impl FnOnce(&mut EngineSnapshot) -> Result<T>) -> Result<T> {
        let mut guard = self.snapshot.write().map_err(lock_error)?;
        let mut next = EngineSnapshot::clone(&guard);
        let output = mutate(&mut next)?;
        *guard = Arc::new(next);
        Ok(output)
    }

    /// Copy of the current state
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn state(&self) -> Result<EngineState> {
        Ok(self.current()?.state.clone())
    }

    /// Registered scenario ids in registration order
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn scenario_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .current()?
            .registry
            .list()
            .map(|scenario| scenario.id().to_owned())
            .collect())
    }

    /// Copy of one registered scenario
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn scenario(&self, id: &str) -> Result<Option<Scenario>> {
        Ok(self.current()?.registry.get(id).cloned())
    }

    /// Validate and register a scenario, replacing one with the same id.
    ///
    /// # Errors
    /// Returns `Error::Validation` or `Error::Pattern`; nothing changes then.
    pub fn register_scenario(&self, definition: ScenarioDefinition) -> Result<()> {
        self.update(|snapshot| {
            Arc::make_mut(&mut snapshot.registry).register(definition)?;
            Ok(())
        })
    }

    /// Remove a scenario and deactivate it in the same step.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn unregister_scenario(&self, id: &str) -> Result<bool> {
        self.update(|snapshot| {
            let removed = Arc::make_mut(&mut snapshot.registry).unregister(id).is_some();
            snapshot.state.deactivate(id);
            Ok(removed)
        })
    }

    /// Activate a registered scenario. Activating an active one does nothing.
    ///
    /// # Errors
    /// Returns `Error::UnknownScenario` if `id` is not registered
    pub fn activate_scenario(&self, id: &str) -> Result<()> {
        self.update(|snapshot| {
            if !snapshot.registry.contains(id) {
                return Err(Error::UnknownScenario(id.to_owned()));
            }
            if snapshot.state.activate(id) {
                tracing::info!("Activated scenario `{id}`");
            }
            Ok(())
        })
    }

    /// Deactivate a scenario. Deactivating an inactive one does nothing.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn deactivate_scenario(&self, id: &str) -> Result<()> {
        self.update(|snapshot| {
            if snapshot.state.deactivate(id) {
                tracing::info!("Deactivated scenario `{id}`");
            }
            Ok(())
        })
    }

    /// Set or replace the override for `endpoint`.
    ///
    /// # Errors
    /// Returns an error for a malformed endpoint key or invalid response
    pub fn set_override(&self, endpoint: &str, response: impl Into<ResponseKind>) -> Result<()> {
        let key = EndpointKey::parse(endpoint)?;
        let response = response.into();
        response.validate()?;
        self.update(|snapshot| {
            snapshot.state.set_override(key, response);
            Ok(())
        })
    }

    /// Remove the override for `endpoint`, if any.
    ///
    /// # Errors
    /// Returns an error for a malformed endpoint key
    pub fn clear_override(&self, endpoint: &str) -> Result<()> {
        let key = EndpointKey::parse(endpoint)?;
        self.update(|snapshot| {
            snapshot.state.clear_override(&key);
            Ok(())
        })
    }

    /// Enable or disable mocking for endpoints matching `selector`.
    ///
    /// # Errors
    /// Returns an error for an empty selector or malformed endpoint key
    pub fn set_endpoint_enabled(&self, selector: &str, enabled: bool) -> Result<()> {
        let selector = EndpointSelector::parse(selector)?;
        self.update(|snapshot| {
            snapshot.state.set_toggle(selector, enabled);
            Ok(())
        })
    }

    /// Replace the toggle policy, keeping explicit toggles.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn set_toggle_policy(&self, policy: TogglePolicy) -> Result<()> {
        self.update(|snapshot| {
            snapshot.state.set_toggle_policy(policy);
            Ok(())
        })
    }

    /// Clear active scenarios, overrides and toggles in one step.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned
    pub fn reset(&self) -> Result<()> {
        self.update(|snapshot| {
            snapshot.state.reset();
            Ok(())
        })?;
        tracing::info!("Mock state reset");
        Ok(())
    }

    /// Resolve one intercepted call against the current snapshot.
    ///
    /// # Errors
    /// Returns `Error::Template` if the chosen response cannot be expanded
    pub fn resolve(&self, request: &ApiRequest) -> Result<Resolution> {
        let snapshot = self.current()?;
        resolver::resolve(request, &snapshot.state, &snapshot.registry, &self.processor)
    }

    /// Reset, then configure the session from an activation route.
    ///
    /// When the route names a scenario it is activated on top of the base
    /// `default` scenario, so fixture content stays visible where the named
    /// scenario has nothing to say.
    ///
    /// # Errors
    /// Returns `Error::UnknownScenario` if the route names an unregistered
    /// scenario; the previous state is kept in that case.
    pub fn apply_route(&self, config: &TestRouteConfig) -> Result<()> {
        self.update(|snapshot| {
            let mut state = EngineState::new();

            if let Some(id) = &config.scenario_id {
                if !snapshot.registry.contains(id) {
                    tracing::warn!("Route {} names unknown scenario `{id}`", config.screen_path);
                    return Err(Error::UnknownScenario(id.clone()));
                }
                if id != BASE_SCENARIO_ID && snapshot.registry.contains(BASE_SCENARIO_ID) {
                    state.activate(BASE_SCENARIO_ID);
                }
                state.activate(id);
            }

            let directives = &config.mock_directives;
            match directives.mode {
                MockMode::All => state.set_toggle_policy(TogglePolicy::AllEnabled),
                MockMode::None => state.set_toggle_policy(TogglePolicy::AllDisabled),
                MockMode::Explicit => {
                    state.set_toggle_policy(TogglePolicy::PerEndpoint {
                        default_enabled: directives.enabled.is_empty(),
                    });
                    for selector in &directives.enabled {
                        state.set_toggle(selector.clone(), true);
                    }
                    for selector in &directives.disabled {
                        state.set_toggle(selector.clone(), false);
                    }
                }
            }

            tracing::info!(
                "Applied route for {}: scenarios {:?}, policy {:?}",
                config.screen_path,
                state.active_scenario_ids(),
                state.toggle_policy()
            );
            snapshot.state = state;
            Ok(())
        })
    }

    /// Parse `href` with the configured marker and apply it.
    ///
    /// # Errors
    /// Same conditions as [`MockController::apply_route`]
    pub fn apply_href(&self, href: &str) -> Result<TestRouteConfig> {
        let config = self.routes.parse_href(href);
        self.apply_route(&config)?;
        Ok(config)
    }

    /// Load fixtures and register the scenarios they describe, all or nothing.
    ///
    /// A fixture scenario that replaces a built-in keeps the built-in's
    /// fallback, so `error` still fails endpoints the fixtures do not cover.
    ///
    /// # Errors
    /// Returns the first validation error; the registry is unchanged then.
    pub fn load_fixtures(&self, source: &dyn FixtureSource) -> Result<FixtureCatalog> {
        let catalog = FixtureCatalog::load(source)?;
        let definitions = catalog.scenarios();
        let count = definitions.len();

        self.update(|snapshot| {
            let registry = Arc::make_mut(&mut snapshot.registry);
            for mut definition in definitions {
                if definition.fallback.is_none()
                    && let Some(ResponseKind::RequestResponse(fallback)) = registry
                        .get(&definition.id)
                        .and_then(Scenario::fallback)
                {
                    definition.fallback = Some(fallback.clone());
                }
                registry.register(definition)?;
            }
            Ok(())
        })?;

        tracing::info!(
            "Registered {count} scenarios from {} fixtures",
            catalog.len()
        );
        Ok(catalog)
    }

    /// Persist the toggle policy and toggles.
    ///
    /// # Errors
    /// Returns an error if serialization or the store fails
    pub fn save_preferences(&self, store: &dyn PreferenceStore) -> Result<()> {
        let snapshot = self.current()?;
        let preferences = TogglePreferences::new(
            snapshot.state.toggle_policy(),
            snapshot.state.endpoint_toggles(),
        );
        store.set(TOGGLES_PREFERENCE_KEY, serde_json::to_string(&preferences)?)
    }

    /// Restore previously saved toggles. Returns whether anything was stored.
    ///
    /// # Errors
    /// Returns an error if the stored value is not valid preferences JSON
    pub fn restore_preferences(&self, store: &dyn PreferenceStore) -> Result<bool> {
        let Some(stored) = store.get(TOGGLES_PREFERENCE_KEY)? else {
            return Ok(false);
        };
        let preferences: TogglePreferences = serde_json::from_str(&stored)?;
        self.update(|snapshot| {
            snapshot
                .state
                .replace_toggles(preferences.policy, preferences.toggle_map());
            Ok(())
        })?;
        tracing::info!(
            "Restored {} endpoint toggles from preferences",
            preferences.toggles.len()
        );
        Ok(true)
    }
}
