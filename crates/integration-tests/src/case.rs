//! Test case format.

use mirage_core::MockResponse;
use mirage_deps::serde_json::Value;
use mirage_engine::ScenarioDefinition;
use serde::Deserialize;

/// One end-to-end case loaded from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    /// What the case demonstrates
    pub description: String,
    /// Session seed; a fixed default keeps cases reproducible
    #[serde(default)]
    pub seed: Option<u64>,
    /// Fixture documents loaded before any step
    #[serde(default)]
    pub fixtures: Vec<Value>,
    /// Extra scenarios registered after the fixtures
    #[serde(default)]
    pub scenarios: Vec<ScenarioDefinition>,
    /// Steps run in order
    pub steps: Vec<CaseStep>,
}

/// A step plus its expected failure, if any
#[derive(Debug, Clone, Deserialize)]
pub struct CaseStep {
    /// What the step does
    #[serde(flatten)]
    pub action: StepAction,
    /// Substring the step's error must contain; the step must succeed when absent
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Operations a case can perform
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Apply an activation route
    Route {
        /// Route href
        href: String,
    },
    /// Activate a scenario on top of the stack
    Activate {
        /// Scenario id
        scenario: String,
    },
    /// Remove a scenario from the stack
    Deactivate {
        /// Scenario id
        scenario: String,
    },
    /// Set a runtime override
    Override {
        /// Endpoint key
        endpoint: String,
        /// Response to return
        response: MockResponse,
    },
    /// Remove a runtime override
    ClearOverride {
        /// Endpoint key
        endpoint: String,
    },
    /// Enable or disable mocking for a selector
    Toggle {
        /// Endpoint key or path fragment
        selector: String,
        /// Whether the endpoint is mocked
        enabled: bool,
    },
    /// Back to the initial state
    Reset,
    /// Send a request through the transport
    Request {
        /// HTTP method
        method: String,
        /// Request path
        path: String,
        /// What the exchange must look like
        #[serde(default)]
        expect: Expectation,
    },
}

/// Assertions on one exchange. Absent fields are not checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Whether the engine answered instead of the backend
    pub mocked: Option<bool>,
    /// Resolution tier as serialized (`scenario`, `override`, ...)
    pub tier: Option<String>,
    /// Scenario that answered
    pub scenario: Option<String>,
    /// Response status
    pub status: Option<u16>,
    /// Exact response body
    pub data: Option<Value>,
    /// Length of an array body
    pub count: Option<usize>,
    /// Field whose values must differ across every row of an array body
    pub distinct: Option<String>,
    /// Captured path parameter values
    pub params: Option<Value>,
    /// Lower bound on the time the exchange took
    pub min_elapsed_ms: Option<u64>,
}
