//! Named scenarios and their registry.

use mirage_core::{
    ApiRequest, EndpointKey, Error, MockResponse, PathParams, ResponseKind, Result, matches,
};
use mirage_deps::tracing;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One endpoint → response pair as written by the scenario author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    /// `METHOD /path` key, validated at registration
    pub endpoint: String,
    /// Response or response template
    pub response: MockResponse,
}

/// Unvalidated scenario, as supplied by callers and fixture catalogues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    /// Unique scenario id
    pub id: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Responses in declaration order
    #[serde(default)]
    pub responses: Vec<ResponseDefinition>,
    /// Response for requests none of `responses` match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<MockResponse>,
}

impl ScenarioDefinition {
    /// Empty definition
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            responses: Vec::new(),
            fallback: None,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a response
    #[must_use]
    pub fn with_response(mut self, endpoint: impl Into<String>, response: MockResponse) -> Self {
        self.responses.push(ResponseDefinition {
            endpoint: endpoint.into(),
            response,
        });
        self
    }

    /// Set the fallback response
    #[must_use]
    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = Some(response);
        self
    }
}

/// A validated scenario response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioEntry {
    /// Parsed endpoint pattern
    pub endpoint: EndpointKey,
    /// Stored response
    pub response: ResponseKind,
}

/// A validated, immutable scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    id: String,
    description: Option<String>,
    entries: Vec<ScenarioEntry>,
    fallback: Option<ResponseKind>,
}

impl Scenario {
    /// Validate a definition.
    ///
    /// # Errors
    /// Returns `Error::Validation` for a bad id, duplicate endpoints or invalid
    /// status codes, and `Error::Pattern` for malformed endpoint templates.
    pub fn from_definition(definition: ScenarioDefinition) -> Result<Self> {
        validate_id(&definition.id)?;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(definition.responses.len());
        for ResponseDefinition { endpoint, response } in definition.responses {
            let key = EndpointKey::parse(&endpoint)?;
            response.validate().map_err(|err| {
                Error::Validation(format!(
                    "scenario `{}` response for {key}: {err}",
                    definition.id
                ))
            })?;
            if !seen.insert(key.clone()) {
                return Err(Error::Validation(format!(
                    "scenario `{}` declares {key} more than once",
                    definition.id
                )));
            }
            entries.push(ScenarioEntry {
                endpoint: key,
                response: response.into(),
            });
        }

        let fallback = definition
            .fallback
            .map(|response| {
                response.validate()?;
                Ok::<_, Error>(ResponseKind::from(response))
            })
            .transpose()?;

        Ok(Self {
            id: definition.id,
            description: definition.description,
            entries,
            fallback,
        })
    }

    /// Scenario id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Description, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Responses in declaration order
    pub fn entries(&self) -> &[ScenarioEntry] {
        &self.entries
    }

    /// Fallback response
    pub fn fallback(&self) -> Option<&ResponseKind> {
        self.fallback.as_ref()
    }

    /// The most specific entry matching `request`; ties go to the earliest declared.
    pub fn best_match(&self, request: &ApiRequest) -> Option<(&ScenarioEntry, PathParams)> {
        let mut best: Option<(&ScenarioEntry, PathParams)> = None;
        for entry in &self.entries {
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
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Validation("scenario id is empty".to_owned()));
    }
    if id.contains(|ch: char| ch == '/' || ch.is_whitespace()) {
        return Err(Error::Validation(format!(
            "scenario id {id:?} must not contain `/` or whitespace"
        )));
    }
    Ok(())
}

/// Scenarios in registration order.
///
/// Cloning is cheap: scenarios are shared behind `Arc` and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a scenario, replacing any with the same id in place.
    ///
    /// Returns whether an existing scenario was replaced.
    ///
    /// # Errors
    /// Returns the validation error; the registry is left untouched.
    pub fn register(&mut self, definition: ScenarioDefinition) -> Result<bool> {
        let scenario = Arc::new(Scenario::from_definition(definition)?);
        let replaced = if let Some(slot) = self
            .scenarios
            .iter_mut()
            .find(|existing| existing.id == scenario.id)
        {
            *slot = Arc::clone(&scenario);
            true
        } else {
            self.scenarios.push(Arc::clone(&scenario));
            false
        };
        tracing::info!(
            "Registered scenario `{}` ({} responses{})",
            scenario.id,
            scenario.entries.len(),
            if replaced { ", replaced" } else { "" }
        );
        Ok(replaced)
    }

    /// Look up a scenario
    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.id == id)
            .map(AsRef::as_ref)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove a scenario, returning it if it was registered
    pub fn unregister(&mut self, id: &str) -> Option<Arc<Scenario>> {
        let index = self.scenarios.iter().position(|scenario| scenario.id == id)?;
        tracing::info!("Unregistered scenario `{id}`");
        Some(self.scenarios.remove(index))
    }

    /// Scenarios in registration order
    pub fn list(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().map(AsRef::as_ref)
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
