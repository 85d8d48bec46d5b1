//! Fixture documents and the sources that supply them.
//!
//! A fixture describes one endpoint:
//!
//! ```json
//! {
//!   "endpoint": "GET /api/chat/sessions",
//!   "description": "Chat sessions",
//!   "delay": 150,
//!   "response": {
//!     "status": 200,
//!     "data": { "generate": { "count": 3, "template": { "id": "{{uuid}}" } } }
//!   },
//!   "variants": { "error": { "status": 500, "data": null } }
//! }
//! ```
//!
//! The base `response` must carry both `status` and `data`; variants are
//! partial and merge over it. Unknown keys are rejected at either level.
//!
//! Base responses become the `default` scenario; every variant name becomes a
//! scenario of its own.

use crate::registry::ScenarioDefinition;
use mirage_core::{EndpointKey, Error, MockResponse, Result};
use mirage_deps::serde_json::{self, Map, Value};
use mirage_deps::tracing;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Scenario id that collects every fixture's base response
pub const BASE_SCENARIO_ID: &str = "default";

/// A raw document plus where it came from, for error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFixture {
    /// File path or other origin label
    pub origin: String,
    /// Parsed but unvalidated document
    pub document: Value,
}

/// Supplies raw fixture documents.
pub trait FixtureSource {
    /// Load every document this source knows about.
    ///
    /// # Errors
    /// Returns an error if documents cannot be read or are not JSON.
    fn load(&self) -> Result<Vec<RawFixture>>;
}

impl FixtureSource for Vec<Value> {
    fn load(&self) -> Result<Vec<RawFixture>> {
        Ok(self
            .iter()
            .enumerate()
            .map(|(index, document)| RawFixture {
                origin: format!("fixture[{index}]"),
                document: document.clone(),
            })
            .collect())
    }
}

/// Reads every `*.json` file below a directory.
#[derive(Debug, Clone)]
pub struct DirectoryFixtureSource {
    root: PathBuf,
}

impl DirectoryFixtureSource {
    /// Source rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FixtureSource for DirectoryFixtureSource {
    fn load(&self) -> Result<Vec<RawFixture>> {
        if !self.root.is_dir() {
            return Err(Error::Validation(format!(
                "Fixture directory {} does not exist",
                self.root.display()
            )));
        }
        let mut paths = discover_fixtures(&self.root)?;
        paths.sort();

        let mut fixtures = Vec::with_capacity(paths.len());
        for path in paths {
            let content = fs::read_to_string(&path).map_err(|err| {
                Error::Validation(format!("Failed to read fixture {}: {err}", path.display()))
            })?;
            if content.trim().is_empty() {
                tracing::warn!("Skipping empty fixture file {}", path.display());
                continue;
            }
            let document = serde_json::from_str(&content).map_err(|err| {
                Error::Validation(format!("Failed to parse fixture {}: {err}", path.display()))
            })?;
            fixtures.push(RawFixture {
                origin: path.display().to_string(),
                document,
            });
        }
        Ok(fixtures)
    }
}

/// Discover all `*.json` files below `dir`, recursing into subdirectories.
///
/// # Errors
/// Returns an error if a directory cannot be read
pub fn discover_fixtures(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut fixtures = Vec::new();

    if !dir.exists() {
        return Ok(fixtures);
    }

    let entries = fs::read_dir(dir)
        .map_err(|err| Error::Other(format!("Failed to read directory: {err}")))?;

    for entry in entries {
        let entry = entry.map_err(|err| Error::Other(format!("Failed to read entry: {err}")))?;
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            fixtures.push(path);
        } else if path.is_dir() {
            fixtures.append(&mut discover_fixtures(&path)?);
        }
    }

    Ok(fixtures)
}

/// A validated fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// Where the document came from
    pub origin: String,
    /// Parsed endpoint key
    pub endpoint: EndpointKey,
    /// Description, if any
    pub description: Option<String>,
    /// Base response with the document-level delay applied
    pub response: MockResponse,
    /// Variant responses, already merged over the base
    pub variants: BTreeMap<String, MockResponse>,
}

impl Fixture {
    /// Validate one raw document.
    ///
    /// # Errors
    /// Returns `Error::Validation` for missing or mistyped fields and
    /// `Error::Pattern` for a malformed endpoint template.
    pub fn from_raw(raw: &RawFixture) -> Result<Self> {
        let origin = raw.origin.as_str();
        let invalid = |reason: String| Error::Validation(format!("{origin}: {reason}"));

        let Value::Object(fields) = &raw.document else {
            return Err(invalid("fixture must be a JSON object".to_owned()));
        };
        if let Some(unknown) = fields.keys().find(|key| {
            !matches!(
                key.as_str(),
                "endpoint" | "description" | "delay" | "response" | "variants"
            )
        }) {
            return Err(invalid(format!("unknown field `{unknown}`")));
        }

        let endpoint = match fields.get("endpoint") {
            Some(Value::String(endpoint)) => EndpointKey::parse(endpoint)?,
            Some(_) => return Err(invalid("`endpoint` must be a string".to_owned())),
            None => return Err(invalid("missing required field `endpoint`".to_owned())),
        };
        let description = match fields.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => return Err(invalid("`description` must be a string".to_owned())),
        };
        let delay = match fields.get("delay") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                invalid("`delay` must be a non-negative integer".to_owned())
            })?),
        };

        let mut base = match fields.get("response") {
            Some(Value::Object(response)) => response.clone(),
            Some(_) => return Err(invalid("`response` must be an object".to_owned())),
            None => return Err(invalid("missing required field `response`".to_owned())),
        };
        check_response_keys(&base).map_err(|reason| invalid(format!("response: {reason}")))?;
        for required in ["status", "data"] {
            if !base.contains_key(required) {
                return Err(invalid(format!("missing required field `response.{required}`")));
            }
        }
        if let Some(inner_delay) = base.remove("delay") {
            base.insert("delayMs".to_owned(), inner_delay);
        }
        if let Some(delay) = delay {
            base.insert("delayMs".to_owned(), Value::from(delay));
        }
        let response = response_from(base.clone(), origin, "response")?;

        let mut variants = BTreeMap::new();
        match fields.get("variants") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (name, partial) in entries {
                    if name == BASE_SCENARIO_ID {
                        return Err(invalid(format!(
                            "variant name `{BASE_SCENARIO_ID}` is reserved for base responses"
                        )));
                    }
                    let Value::Object(partial) = partial else {
                        return Err(invalid(format!("variant `{name}` must be an object")));
                    };
                    check_response_keys(partial)
                        .map_err(|reason| invalid(format!("variant `{name}`: {reason}")))?;
                    let mut merged = base.clone();
                    for (key, value) in partial {
                        let key = if key == "delay" { "delayMs" } else { key.as_str() };
                        merged.insert(key.to_owned(), value.clone());
                    }
                    let variant = response_from(merged, origin, &format!("variant `{name}`"))?;
                    variants.insert(name.clone(), variant);
                }
            }
            Some(_) => return Err(invalid("`variants` must be an object".to_owned())),
        }

        Ok(Self {
            origin: origin.to_owned(),
            endpoint,
            description,
            response,
            variants,
        })
    }
}

fn check_response_keys(fields: &Map<String, Value>) -> std::result::Result<(), String> {
    match fields
        .keys()
        .find(|key| !matches!(key.as_str(), "status" | "data" | "delay" | "delayMs" | "headers"))
    {
        Some(unknown) => Err(format!("unknown field `{unknown}`")),
        None => Ok(()),
    }
}

fn response_from(fields: Map<String, Value>, origin: &str, what: &str) -> Result<MockResponse> {
    let response: MockResponse = serde_json::from_value(Value::Object(fields))
        .map_err(|err| Error::Validation(format!("{origin}: invalid {what}: {err}")))?;
    response
        .validate()
        .map_err(|err| Error::Validation(format!("{origin}: {what}: {err}")))?;
    Ok(response)
}

/// Every fixture from a source, validated together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureCatalog {
    fixtures: Vec<Fixture>,
}

impl FixtureCatalog {
    /// Load and validate everything `source` provides.
    ///
    /// # Errors
    /// Returns the first validation error; nothing is kept in that case.
    pub fn load(source: &dyn FixtureSource) -> Result<Self> {
        let raw = source.load()?;
        let mut fixtures: Vec<Fixture> = Vec::with_capacity(raw.len());
        for document in &raw {
            let fixture = Fixture::from_raw(document)?;
            if let Some(previous) = fixtures
                .iter()
                .find(|existing| existing.endpoint == fixture.endpoint)
            {
                return Err(Error::Validation(format!(
                    "{}: endpoint {} is already defined by {}",
                    fixture.origin, fixture.endpoint, previous.origin
                )));
            }
            fixtures.push(fixture);
        }
        tracing::info!("Loaded {} fixtures", fixtures.len());
        Ok(Self { fixtures })
    }

    /// Validated fixtures in load order
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Number of fixtures
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Whether no fixtures were loaded
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Scenario definitions: `default` first, then one per variant name.
    pub fn scenarios(&self) -> Vec<ScenarioDefinition> {
        let mut base = ScenarioDefinition::new(BASE_SCENARIO_ID)
            .with_description("Base fixture responses");
        let mut variants: BTreeMap<&str, ScenarioDefinition> = BTreeMap::new();

        for fixture in &self.fixtures {
            base = base.with_response(fixture.endpoint.as_str(), fixture.response.clone());
            for (name, response) in &fixture.variants {
                let definition = variants.remove(name.as_str()).unwrap_or_else(|| {
                    ScenarioDefinition::new(name.as_str())
                        .with_description(format!("Fixture variant `{name}`"))
                });
                variants.insert(
                    name.as_str(),
                    definition.with_response(fixture.endpoint.as_str(), response.clone()),
                );
            }
        }

        let mut scenarios = vec![base];
        scenarios.extend(variants.into_values());
        scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_deps::serde_json::json;
    use mirage_deps::tempfile::TempDir;

    fn sessions_fixture() -> Value {
        json!({
            "endpoint": "GET /api/chat/sessions",
            "description": "Chat sessions",
            "delay": 150,
            "response": { "status": 200, "data": [{ "id": "{{uuid}}" }] },
            "variants": {
                "error": { "status": 500, "data": { "message": "boom" } },
                "slow": { "delay": 5000 }
            }
        })
    }

    fn raw(document: Value) -> RawFixture {
        RawFixture {
            origin: "test.json".to_owned(),
            document,
        }
    }

    #[test]
    fn test_valid_fixture() {
        let fixture = Fixture::from_raw(&raw(sessions_fixture())).unwrap();
        assert_eq!(fixture.endpoint.as_str(), "GET /api/chat/sessions");
        assert_eq!(fixture.response.delay_ms, 150);
        assert_eq!(fixture.description.as_deref(), Some("Chat sessions"));

        let error = &fixture.variants["error"];
        assert_eq!(error.status, 500);
        assert_eq!(error.delay_ms, 150);
        assert_eq!(error.data, json!({ "message": "boom" }));

        let slow = &fixture.variants["slow"];
        assert_eq!(slow.status, 200);
        assert_eq!(slow.delay_ms, 5000);
        assert_eq!(slow.data, json!([{ "id": "{{uuid}}" }]));
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        let ok = json!({ "status": 200, "data": null });
        let cases = [
            json!([]),
            json!({ "response": { "status": 200, "data": [] } }),
            json!({ "endpoint": "GET /x" }),
            json!({ "endpoint": 3, "response": ok }),
            json!({ "endpoint": "GET /x", "response": [] }),
            json!({ "endpoint": "GET /x", "response": { "status": 1000, "data": null } }),
            json!({ "endpoint": "GET /x", "response": ok, "delay": -5 }),
            json!({ "endpoint": "GET /x", "response": ok, "variants": { "a": 1 } }),
            json!({ "endpoint": "GET /x", "response": ok, "variants": { "default": {} } }),
            json!({ "endpoint": "GET /x", "response": ok, "extra": true }),
        ];
        for document in cases {
            let err = Fixture::from_raw(&raw(document.clone())).unwrap_err();
            assert!(err.is_validation_error(), "{document} gave {err:?}");
        }

        let err = Fixture::from_raw(&raw(json!({ "endpoint": "GET x", "response": ok })))
            .unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn test_incomplete_or_misspelled_response_is_rejected() {
        let cases = [
            json!({ "endpoint": "GET /x", "response": {} }),
            json!({ "endpoint": "GET /x", "response": { "status": 200 } }),
            json!({ "endpoint": "GET /x", "response": { "data": [1] } }),
            json!({ "endpoint": "GET /x", "response": { "stauts": 404, "dta": [1] } }),
            json!({ "endpoint": "GET /x", "response": { "status": 404, "data": [1], "dealy": 5 } }),
            json!({
                "endpoint": "GET /x",
                "response": { "status": 200, "data": [] },
                "variants": { "error": { "stats": 500 } }
            }),
        ];
        for document in cases {
            let err = Fixture::from_raw(&raw(document.clone())).unwrap_err();
            assert!(err.is_validation_error(), "{document} gave {err:?}");
        }

        let partial_variant = json!({
            "endpoint": "GET /x",
            "response": { "status": 200, "data": [], "headers": { "x-mock": "1" } },
            "variants": { "slow": { "delayMs": 900 } }
        });
        let fixture = Fixture::from_raw(&raw(partial_variant)).unwrap();
        assert_eq!(fixture.variants["slow"].delay_ms, 900);
        assert_eq!(fixture.variants["slow"].status, 200);
    }

    #[test]
    fn test_catalog_scenarios() {
        let source = vec![
            sessions_fixture(),
            json!({
                "endpoint": "GET /api/chat/sessions/:id/messages",
                "response": { "status": 200, "data": [] },
                "variants": { "error": { "status": 503 } }
            }),
        ];
        let catalog = FixtureCatalog::load(&source).unwrap();
        assert_eq!(catalog.len(), 2);

        let scenarios = catalog.scenarios();
        let ids: Vec<&str> = scenarios.iter().map(|scenario| scenario.id.as_str()).collect();
        assert_eq!(ids, vec!["default", "error", "slow"]);
        assert_eq!(scenarios[0].responses.len(), 2);
        assert_eq!(scenarios[1].responses.len(), 2);
        assert_eq!(scenarios[1].responses[1].response.status, 503);
        assert_eq!(scenarios[2].responses.len(), 1);
    }

    #[test]
    fn test_catalog_rejects_duplicate_endpoints() {
        let source = vec![
            json!({ "endpoint": "GET /x", "response": { "status": 200, "data": 1 } }),
            json!({ "endpoint": "get /x", "response": { "status": 200, "data": 2 } }),
        ];
        let err = FixtureCatalog::load(&source).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_directory_source_recurses_and_skips_empty_files() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("chat");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("sessions.json"), sessions_fixture().to_string()).unwrap();
        fs::write(temp.path().join("empty.json"), "  \n").unwrap();
        fs::write(temp.path().join("notes.txt"), "not a fixture").unwrap();

        let source = DirectoryFixtureSource::new(temp.path());
        let raw = source.load().unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw[0].origin.ends_with("sessions.json"));
    }

    #[test]
    fn test_directory_source_reports_bad_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.json"), "{ nope").unwrap();
        let err = DirectoryFixtureSource::new(temp.path()).load().unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let source = DirectoryFixtureSource::new(temp.path().join("missing"));
        let err = source.load().unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("does not exist"), "{err}");

        assert!(discover_fixtures(&temp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_directory_loads_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(DirectoryFixtureSource::new(temp.path()).load().unwrap().is_empty());
    }
}
