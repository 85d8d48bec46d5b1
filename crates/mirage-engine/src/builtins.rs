//! Well-known scenarios registered before any fixtures.

use crate::registry::ScenarioDefinition;
use mirage_core::MockResponse;
use mirage_core::config::BuiltinConfig;
use mirage_deps::serde_json::{Value, json};

/// Ids of the built-in scenarios, in registration order
pub const BUILTIN_SCENARIO_IDS: [&str; 8] = [
    "default",
    "empty",
    "error",
    "slow",
    "very-slow",
    "timeout",
    "not-found",
    "unauthorized",
];

/// Tags the engine passes through for callers to act on
pub const WELL_KNOWN_TAGS: [&str; 4] = ["slow", "paginated", "loading", "offline"];

fn error_body(status: u16, message: &str) -> Value {
    json!({ "error": { "status": status, "message": message } })
}

/// Definitions for every built-in scenario.
///
/// Each answers unmatched requests through its fallback, except `default`,
/// which has none and so lets fixture content or the real backend answer.
pub fn builtin_scenarios(config: &BuiltinConfig) -> Vec<ScenarioDefinition> {
    vec![
        ScenarioDefinition::new("default").with_description("No canned behaviour"),
        ScenarioDefinition::new("empty")
            .with_description("Every endpoint returns an empty list")
            .with_fallback(MockResponse::ok(json!([]))),
        ScenarioDefinition::new("error")
            .with_description("Every endpoint fails with 500")
            .with_fallback(MockResponse::new(500, error_body(500, "Internal Server Error"))),
        ScenarioDefinition::new("slow")
            .with_description("Responses arrive after a noticeable delay")
            .with_fallback(MockResponse::ok(Value::Null).with_delay(config.slow_delay_ms)),
        ScenarioDefinition::new("very-slow")
            .with_description("Responses arrive after a long delay")
            .with_fallback(MockResponse::ok(Value::Null).with_delay(config.very_slow_delay_ms)),
        ScenarioDefinition::new("timeout")
            .with_description("Responses time out at the gateway")
            .with_fallback(
                MockResponse::new(504, error_body(504, "Gateway Timeout"))
                    .with_delay(config.timeout_delay_ms),
            ),
        ScenarioDefinition::new("not-found")
            .with_description("Every endpoint returns 404")
            .with_fallback(MockResponse::new(404, error_body(404, "Not Found"))),
        ScenarioDefinition::new("unauthorized")
            .with_description("Every endpoint returns 401")
            .with_fallback(MockResponse::new(401, error_body(401, "Unauthorized"))),
    ]
}
