//! The engine's one mutable entity, as a plain value.
//!
//! Every mutation here works on an owned `EngineState`. The controller clones
//! the current snapshot, applies the mutation and swaps the result in, so
//! readers only ever see whole states.

use mirage_core::{ApiRequest, EndpointKey, EndpointSelector, ResponseKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which endpoints may be mocked at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TogglePolicy {
    /// Every endpoint may be mocked
    #[default]
    AllEnabled,
    /// Every request passes through
    AllDisabled,
    /// Toggles decide; endpoints without a toggle use `default_enabled`
    PerEndpoint {
        /// What endpoints without a matching toggle do
        default_enabled: bool,
    },
}

/// Outcome of the enable/disable gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate<'state> {
    /// Resolution continues to the tiers
    Open,
    /// A toggle disabled the endpoint
    Disabled(&'state EndpointSelector),
    /// The policy disabled the endpoint
    PolicyDisabled,
}

/// A runtime response override for one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointOverride {
    /// Endpoint pattern the override answers
    pub endpoint: EndpointKey,
    /// Response to return
    pub response: ResponseKind,
}

/// Active scenarios, overrides and endpoint toggles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    active_scenario_ids: Vec<String>,
    overrides: Vec<EndpointOverride>,
    endpoint_toggles: BTreeMap<EndpointSelector, bool>,
    toggle_policy: TogglePolicy,
}

impl EngineState {
    /// Fresh state: nothing active, everything enabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active scenario ids in activation order
    pub fn active_scenario_ids(&self) -> &[String] {
        &self.active_scenario_ids
    }

    /// Overrides, oldest first
    pub fn overrides(&self) -> &[EndpointOverride] {
        &self.overrides
    }

    /// Explicit endpoint toggles
    pub fn endpoint_toggles(&self) -> &BTreeMap<EndpointSelector, bool> {
        &self.endpoint_toggles
    }

    /// Current toggle policy
    pub fn toggle_policy(&self) -> TogglePolicy {
        self.toggle_policy
    }

    /// Whether `id` is active
    pub fn is_active(&self, id: &str) -> bool {
        self.active_scenario_ids.iter().any(|active| active == id)
    }

    /// Append `id` unless already active. Returns whether anything changed.
    pub fn activate(&mut self, id: &str) -> bool {
        if self.is_active(id) {
            return false;
        }
        self.active_scenario_ids.push(id.to_owned());
        true
    }

    /// Remove `id` if active. Returns whether anything changed.
    pub fn deactivate(&mut self, id: &str) -> bool {
        let before = self.active_scenario_ids.len();
        self.active_scenario_ids.retain(|active| active != id);
        before != self.active_scenario_ids.len()
    }

    /// Upsert an override; it becomes the most recently set one.
    pub fn set_override(&mut self, endpoint: EndpointKey, response: ResponseKind) {
        self.overrides.retain(|existing| existing.endpoint != endpoint);
        self.overrides.push(EndpointOverride { endpoint, response });
    }

    /// Remove the override for `endpoint`. Returns whether one existed.
    pub fn clear_override(&mut self, endpoint: &EndpointKey) -> bool {
        let before = self.overrides.len();
        self.overrides.retain(|existing| &existing.endpoint != endpoint);
        before != self.overrides.len()
    }

    /// Record an explicit toggle.
    ///
    /// Toggles only count under `PerEndpoint`, so a blanket policy is turned
    /// into the equivalent per-endpoint one first.
    pub fn set_toggle(&mut self, selector: EndpointSelector, enabled: bool) {
        self.toggle_policy = match self.toggle_policy {
            TogglePolicy::AllEnabled => TogglePolicy::PerEndpoint {
                default_enabled: true,
            },
            TogglePolicy::AllDisabled => TogglePolicy::PerEndpoint {
                default_enabled: false,
            },
            per_endpoint @ TogglePolicy::PerEndpoint { .. } => per_endpoint,
        };
        self.endpoint_toggles.insert(selector, enabled);
    }

    /// Remove an explicit toggle. Returns whether one existed.
    pub fn clear_toggle(&mut self, selector: &EndpointSelector) -> bool {
        self.endpoint_toggles.remove(selector).is_some()
    }

    /// Replace the policy, keeping toggles.
    pub fn set_toggle_policy(&mut self, policy: TogglePolicy) {
        self.toggle_policy = policy;
    }

    /// Replace policy and toggles together.
    pub fn replace_toggles(
        &mut self,
        policy: TogglePolicy,
        toggles: BTreeMap<EndpointSelector, bool>,
    ) {
        self.toggle_policy = policy;
        self.endpoint_toggles = toggles;
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate the enable/disable gate for `request`.
    ///
    /// Under `PerEndpoint`, a matching disable wins over any matching enable.
    pub fn gate(&self, request: &ApiRequest) -> Gate<'_> {
        match self.toggle_policy {
            TogglePolicy::AllEnabled => Gate::Open,
            TogglePolicy::AllDisabled => Gate::PolicyDisabled,
            TogglePolicy::PerEndpoint { default_enabled } => {
                let mut enabled_match = false;
                for (selector, enabled) in &self.endpoint_toggles {
                    if !selector.applies_to(request) {
                        continue;
                    }
                    if !enabled {
                        return Gate::Disabled(selector);
                    }
                    enabled_match = true;
                }
                if enabled_match || default_enabled {
                    Gate::Open
                } else {
                    Gate::PolicyDisabled
                }
            }
        }
    }
}
