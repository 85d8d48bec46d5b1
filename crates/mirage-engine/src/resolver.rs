//! The per-request decision function.
//!
//! A request first passes the enable/disable gate, then three tiers are tried
//! top-down and the first hit wins: overrides, active scenarios (most recently
//! activated first), pass-through.

use crate::registry::ScenarioRegistry;
use crate::state::{EndpointOverride, EngineState, Gate};
use mirage_core::{
    ApiRequest, EndpointKey, EndpointSelector, MockResponse, PathParams, ResponseKind, Result,
    matches,
};
use mirage_deps::tracing;
use mirage_template::TemplateProcessor;
use serde::Serialize;

/// What the caller should do with the intercepted call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", content = "response", rename_all = "snake_case")]
pub enum Decision {
    /// Answer with this response instead of calling the backend
    ShortCircuit(MockResponse),
    /// Let the call reach the real backend
    PassThrough,
}

impl Decision {
    /// The response, when short-circuiting
    pub fn response(&self) -> Option<&MockResponse> {
        match self {
            Self::ShortCircuit(response) => Some(response),
            Self::PassThrough => None,
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// An explicit toggle disabled the endpoint
    Disabled {
        /// The toggle that matched
        selector: EndpointSelector,
    },
    /// The toggle policy disabled the endpoint
    PolicyDisabled,
    /// A runtime override answered
    Override {
        /// Override key that matched
        endpoint: EndpointKey,
    },
    /// An active scenario's response answered
    Scenario {
        /// Scenario that answered
        scenario_id: String,
        /// Scenario key that matched
        endpoint: EndpointKey,
    },
    /// An active scenario's fallback answered
    ScenarioFallback {
        /// Scenario that answered
        scenario_id: String,
    },
    /// Nothing matched
    NoMatch,
}

/// A decision and the reason for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// What to do
    #[serde(flatten)]
    pub decision: Decision,
    /// Why
    pub source: ResolutionSource,
    /// Values bound by `:name` segments of the matching key
    #[serde(skip_serializing_if = "PathParams::is_empty")]
    pub params: PathParams,
}

impl Resolution {
    fn pass_through(source: ResolutionSource) -> Self {
        Self {
            decision: Decision::PassThrough,
            source,
            params: PathParams::new(),
        }
    }

    /// Whether the call is answered with a mock
    pub fn is_short_circuit(&self) -> bool {
        matches!(self.decision, Decision::ShortCircuit(_))
    }
}

/// Resolve `request` against one consistent snapshot.
///
/// # Errors
/// Returns `Error::Template` when the chosen response cannot be expanded. A
/// broken template is never replaced with a default value.
pub fn resolve(
    request: &ApiRequest,
    state: &EngineState,
    registry: &ScenarioRegistry,
    processor: &TemplateProcessor,
) -> Result<Resolution> {
    match state.gate(request) {
        Gate::Open => {}
        Gate::Disabled(selector) => {
            tracing::debug!("{request}: disabled by toggle `{selector}`, passing through");
            return Ok(Resolution::pass_through(ResolutionSource::Disabled {
                selector: selector.clone(),
            }));
        }
        Gate::PolicyDisabled => {
            tracing::debug!("{request}: disabled by toggle policy, passing through");
            return Ok(Resolution::pass_through(ResolutionSource::PolicyDisabled));
        }
    }

    if let Some((entry, params)) = best_override(request, state) {
        tracing::debug!("{request}: override `{}`", entry.endpoint);
        return Ok(Resolution {
            decision: materialize(&entry.response, processor)?,
            source: ResolutionSource::Override {
                endpoint: entry.endpoint.clone(),
            },
            params,
        });
    }

    for scenario_id in state.active_scenario_ids().iter().rev() {
        let Some(scenario) = registry.get(scenario_id) else {
            continue;
        };
        if let Some((entry, params)) = scenario.best_match(request) {
            tracing::debug!(
                "{request}: scenario `{scenario_id}` key `{}`",
                entry.endpoint
            );
            return Ok(Resolution {
                decision: materialize(&entry.response, processor)?,
                source: ResolutionSource::Scenario {
                    scenario_id: scenario_id.clone(),
                    endpoint: entry.endpoint.clone(),
                },
                params,
            });
        }
        if let Some(fallback) = scenario.fallback() {
            tracing::debug!("{request}: scenario `{scenario_id}` fallback");
            return Ok(Resolution {
                decision: materialize(fallback, processor)?,
                source: ResolutionSource::ScenarioFallback {
                    scenario_id: scenario_id.clone(),
                },
                params: PathParams::new(),
            });
        }
    }

    tracing::debug!("{request}: no match, passing through");
    Ok(Resolution::pass_through(ResolutionSource::NoMatch))
}

/// Most specific matching override; ties go to the most recently set.
fn best_override<'state>(
    request: &ApiRequest,
    state: &'state EngineState,
) -> Option<(&'state EndpointOverride, PathParams)> {
    let mut best: Option<(&EndpointOverride, PathParams)> = None;
    for entry in state.overrides().iter().rev() {
        let Some(params) = matches(&entry.endpoint, request) else {
            continue;
        };
        let better = best.as_ref().is_none_or(|(current, _)| {
            entry.endpoint.specificity() > current.endpoint.specificity()
        });
        if better {
            best = Some((entry, params));
        }
    }
    best
}

fn materialize(response: &ResponseKind, processor: &TemplateProcessor) -> Result<Decision> {
    match response {
        ResponseKind::RequestResponse(stored) => {
            Ok(Decision::ShortCircuit(processor.expand_response(stored)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ScenarioDefinition;
    use crate::state::TogglePolicy;
    use mirage_core::{Error, TemplateError};
    use mirage_deps::serde_json::{json, to_value};

    fn key(text: &str) -> EndpointKey {
        EndpointKey::parse(text).unwrap()
    }

    fn registry() -> ScenarioRegistry {
        let mut registry = ScenarioRegistry::new();
        registry
            .register(
                ScenarioDefinition::new("a")
                    .with_response("GET /items", MockResponse::ok(json!("from a")))
                    .with_response("GET /items/:id", MockResponse::ok(json!("item from a"))),
            )
            .unwrap();
        registry
            .register(
                ScenarioDefinition::new("b")
                    .with_response("GET /items", MockResponse::ok(json!("from b"))),
            )
            .unwrap();
        registry
            .register(
                ScenarioDefinition::new("broken")
                    .with_response("GET /items", MockResponse::ok(json!("{{nope}}"))),
            )
            .unwrap();
        registry
            .register(
                ScenarioDefinition::new("empty").with_fallback(MockResponse::ok(json!([]))),
            )
            .unwrap();
        registry
    }

    fn run(state: &EngineState, method: &str, path: &str) -> Resolution {
        resolve(
            &ApiRequest::new(method, path),
            state,
            &registry(),
            &TemplateProcessor::with_seed(1),
        )
        .unwrap()
    }

    fn data(resolution: &Resolution) -> Option<&mirage_deps::serde_json::Value> {
        resolution.decision.response().map(|response| &response.data)
    }

    #[test]
    fn test_nothing_active_passes_through() {
        let resolution = run(&EngineState::new(), "GET", "/items");
        assert_eq!(resolution.decision, Decision::PassThrough);
        assert_eq!(resolution.source, ResolutionSource::NoMatch);
    }

    #[test]
    fn test_scenario_stacking() {
        let mut state = EngineState::new();
        state.activate("a");
        state.activate("b");
        assert_eq!(data(&run(&state, "GET", "/items")), Some(&json!("from b")));
        state.deactivate("b");
        assert_eq!(data(&run(&state, "GET", "/items")), Some(&json!("from a")));
    }

    #[test]
    fn test_later_scenario_without_match_falls_through_to_earlier() {
        let mut state = EngineState::new();
        state.activate("a");
        state.activate("b");
        let resolution = run(&state, "get", "/items/9");
        assert_eq!(data(&resolution), Some(&json!("item from a")));
        assert_eq!(resolution.params.get("id").map(String::as_str), Some("9"));
        assert_eq!(
            resolution.source,
            ResolutionSource::Scenario {
                scenario_id: "a".to_owned(),
                endpoint: key("GET /items/:id"),
            }
        );
    }

    #[test]
    fn test_override_always_wins() {
        let mut state = EngineState::new();
        state.activate("a");
        state.activate("b");
        state.set_override(key("GET /items"), MockResponse::new(418, json!("override")).into());
        let resolution = run(&state, "GET", "/items");
        assert_eq!(resolution.decision.response().map(|response| response.status), Some(418));
        assert_eq!(
            resolution.source,
            ResolutionSource::Override {
                endpoint: key("GET /items")
            }
        );
    }

    #[test]
    fn test_most_specific_override_then_most_recent() {
        let mut state = EngineState::new();
        state.set_override(key("GET /items/featured"), MockResponse::ok(json!("literal")).into());
        state.set_override(key("GET /items/:id"), MockResponse::ok(json!("param")).into());
        assert_eq!(data(&run(&state, "GET", "/items/featured")), Some(&json!("literal")));

        state.set_override(key("GET /:kind/featured"), MockResponse::ok(json!("newer")).into());
        state.clear_override(&key("GET /items/featured"));
        assert_eq!(data(&run(&state, "GET", "/items/featured")), Some(&json!("newer")));
    }

    #[test]
    fn test_disabled_endpoint_gate_beats_everything() {
        let mut state = EngineState::new();
        state.activate("a");
        state.set_override(key("GET /items"), MockResponse::ok(json!("override")).into());
        state.set_toggle(EndpointSelector::Key(key("GET /items")), false);

        let resolution = run(&state, "GET", "/items");
        assert_eq!(resolution.decision, Decision::PassThrough);
        assert!(matches!(resolution.source, ResolutionSource::Disabled { .. }));
        assert!(run(&state, "GET", "/items/3").is_short_circuit());
    }

    #[test]
    fn test_policy_disabled() {
        let mut state = EngineState::new();
        state.activate("a");
        state.set_toggle_policy(TogglePolicy::AllDisabled);
        let resolution = run(&state, "GET", "/items");
        assert_eq!(resolution.source, ResolutionSource::PolicyDisabled);
    }

    #[test]
    fn test_fallback_answers_unmatched_requests() {
        let mut state = EngineState::new();
        state.activate("a");
        state.activate("empty");
        let resolution = run(&state, "POST", "/anything");
        assert_eq!(data(&resolution), Some(&json!([])));
        assert_eq!(
            resolution.source,
            ResolutionSource::ScenarioFallback {
                scenario_id: "empty".to_owned()
            }
        );
    }

    #[test]
    fn test_template_errors_propagate() {
        let mut state = EngineState::new();
        state.activate("broken");
        let err = resolve(
            &ApiRequest::new("GET", "/items"),
            &state,
            &registry(),
            &TemplateProcessor::with_seed(1),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::UnknownGenerator(_))
        ));
    }

    #[test]
    fn test_resolution_serializes_explainably() {
        let mut state = EngineState::new();
        state.activate("a");
        let value = to_value(run(&state, "GET", "/items/5")).unwrap();
        assert_eq!(value["decision"], "short_circuit");
        assert_eq!(value["response"]["data"], "item from a");
        assert_eq!(value["source"]["tier"], "scenario");
        assert_eq!(value["source"]["endpoint"], "GET /items/:id");
        assert_eq!(value["params"]["id"], "5");
    }
}
