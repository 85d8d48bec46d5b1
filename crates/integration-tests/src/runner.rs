//! Case runner.
//!
//! Builds a controller from a case's fixtures and scenarios, then runs the
//! steps against it through a [`MockTransport`], collecting every check into
//! a [`VerificationResult`].

use super::case::{CaseStep, Expectation, StepAction, TestCase};
use super::transport::{Exchange, MockTransport, RecordingBackend};
use super::verification_result::VerificationResult;
use mirage_core::{ApiRequest, MirageConfig, Result};
use mirage_deps::serde_json::{Value, to_value};
use mirage_deps::tracing;
use mirage_engine::MockController;
use std::collections::HashSet;
use std::sync::Arc;

/// Seed used when a case does not pick one
const DEFAULT_CASE_SEED: u64 = 0x5eed;

/// Runs one [`TestCase`]
pub struct CaseRunner {
    case: TestCase,
    transport: MockTransport<RecordingBackend>,
}

impl CaseRunner {
    /// Register the case's fixtures and scenarios on a fresh controller
    ///
    /// # Errors
    /// Returns error if a fixture or scenario is rejected
    pub fn new(case: TestCase) -> Result<Self> {
        let mut config = MirageConfig::default();
        config.session.seed = Some(case.seed.unwrap_or(DEFAULT_CASE_SEED));

        let controller = MockController::new(&config)?;
        if !case.fixtures.is_empty() {
            controller.load_fixtures(&case.fixtures)?;
        }
        for scenario in &case.scenarios {
            controller.register_scenario(scenario.clone())?;
        }

        Ok(Self {
            case,
            transport: MockTransport::new(Arc::new(controller), RecordingBackend::new()),
        })
    }

    /// The transport steps go through
    pub fn transport(&self) -> &MockTransport<RecordingBackend> {
        &self.transport
    }

    /// Run every step in order
    pub async fn run(&self) -> VerificationResult {
        let mut result = VerificationResult::new();
        for (index, step) in self.case.steps.iter().enumerate() {
            let label = format!("step {index}");
            result.merge(self.run_step(&label, step).await);
        }
        tracing::debug!(
            "{}: {} checks, {} failed",
            self.case.description,
            result.checks(),
            result.failures().len()
        );
        result
    }

    async fn run_step(&self, label: &str, step: &CaseStep) -> VerificationResult {
        let mut result = VerificationResult::new();
        let outcome = match &step.action {
            StepAction::Request {
                method,
                path,
                expect,
            } => {
                let request = ApiRequest::new(method, path);
                self.transport.fetch(&request).await.map(|exchange| {
                    result.merge(verify_exchange(
                        &format!("{label} ({request})"),
                        &exchange,
                        expect,
                    ));
                })
            }
            action => self.apply(action),
        };

        match (outcome, &step.expect_error) {
            (Ok(()), None) => {}
            (Ok(()), Some(expected)) => {
                result.fail(format!("{label}: expected error containing {expected:?}"));
            }
            (Err(err), None) => result.fail(format!("{label}: {err}")),
            (Err(err), Some(expected)) => {
                let message = err.to_string();
                result.check(message.contains(expected.as_str()), || {
                    format!("{label}: error {message:?} does not contain {expected:?}")
                });
            }
        }
        result
    }

    fn apply(&self, action: &StepAction) -> Result<()> {
        let controller = self.transport.controller();
        match action {
            StepAction::Route { href } => controller.apply_href(href).map(|_| ()),
            StepAction::Activate { scenario } => controller.activate_scenario(scenario),
            StepAction::Deactivate { scenario } => controller.deactivate_scenario(scenario),
            StepAction::Override { endpoint, response } => {
                controller.set_override(endpoint, response.clone())
            }
            StepAction::ClearOverride { endpoint } => controller.clear_override(endpoint),
            StepAction::Toggle { selector, enabled } => {
                controller.set_endpoint_enabled(selector, *enabled)
            }
            StepAction::Reset => controller.reset(),
            StepAction::Request { .. } => Ok(()),
        }
    }
}

fn source_field(exchange: &Exchange, field: &str) -> Option<Value> {
    to_value(&exchange.resolution.source)
        .ok()
        .and_then(|source| source.get(field).cloned())
}

fn verify_exchange(label: &str, exchange: &Exchange, expect: &Expectation) -> VerificationResult {
    let mut result = VerificationResult::new();
    let response = &exchange.response;

    if let Some(mocked) = expect.mocked {
        result.check(exchange.mocked() == mocked, || {
            format!("{label}: mocked is {} (expected {mocked})", exchange.mocked())
        });
    }
    if let Some(tier) = &expect.tier {
        let actual = source_field(exchange, "tier");
        result.check(actual.as_ref().and_then(Value::as_str) == Some(tier.as_str()), || {
            format!("{label}: tier {actual:?} (expected {tier})")
        });
    }
    if let Some(scenario) = &expect.scenario {
        let actual = source_field(exchange, "scenario_id");
        result.check(actual.as_ref().and_then(Value::as_str) == Some(scenario.as_str()), || {
            format!("{label}: scenario {actual:?} (expected {scenario})")
        });
    }
    if let Some(status) = expect.status {
        result.check(response.status == status, || {
            format!("{label}: status {} (expected {status})", response.status)
        });
    }
    if let Some(data) = &expect.data {
        result.check(&response.data == data, || {
            format!("{label}: data {} (expected {data})", response.data)
        });
    }
    if let Some(count) = expect.count {
        let actual = response.data.as_array().map(Vec::len);
        result.check(actual == Some(count), || {
            format!("{label}: row count {actual:?} (expected {count})")
        });
    }
    if let Some(field) = &expect.distinct {
        let rows = response.data.as_array().map_or(&[][..], Vec::as_slice);
        let values: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.get(field))
            .map(Value::to_string)
            .collect();
        result.check(!rows.is_empty() && values.len() == rows.len(), || {
            format!("{label}: `{field}` not distinct across {} rows", rows.len())
        });
    }
    if let Some(params) = &expect.params {
        let actual = to_value(&exchange.resolution.params).unwrap_or(Value::Null);
        result.check(&actual == params, || {
            format!("{label}: params {actual} (expected {params})")
        });
    }
    if let Some(min_elapsed) = expect.min_elapsed_ms {
        let elapsed = exchange.elapsed.as_millis();
        result.check(elapsed >= u128::from(min_elapsed), || {
            format!("{label}: took {elapsed}ms (expected at least {min_elapsed}ms)")
        });
    }
    result
}
