//! Expansion of fixture templates into concrete values.

use crate::generators::GenerationContext;
use crate::placeholder::{self, Piece};
use crate::rng::SessionRng;
use mirage_core::config::SessionConfig;
use mirage_core::{MockResponse, Result, TemplateError};
use mirage_deps::chrono::{DateTime, Utc};
use mirage_deps::serde_json::{Map, Value};
use mirage_deps::tracing;

/// Key that marks a bulk-generation directive
const GENERATE_KEY: &str = "generate";

/// Expands placeholders and `generate` directives.
///
/// Inputs are never mutated: every expansion builds a fresh tree, so two
/// occurrences of the same template never share generated values.
#[derive(Debug)]
pub struct TemplateProcessor {
    rng: SessionRng,
    anchor: DateTime<Utc>,
    max_generate_count: usize,
}

impl TemplateProcessor {
    /// Create a processor for a new session
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            rng: SessionRng::new(config.seed),
            anchor: Utc::now(),
            max_generate_count: config.max_generate_count,
        }
    }

    /// Processor with a fixed seed and default limits
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(&SessionConfig {
            seed: Some(seed),
            ..SessionConfig::default()
        })
    }

    /// Fix the instant that relative dates count back from
    #[must_use]
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    /// Seed of this session's random source
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Whether `value` contains anything `expand` would rewrite
    pub fn is_templated(value: &Value) -> bool {
        match value {
            Value::String(text) => placeholder::has_placeholder(text),
            Value::Array(items) => items.iter().any(Self::is_templated),
            Value::Object(map) => {
                is_directive(map).is_some() || map.values().any(Self::is_templated)
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Expand a template value.
    ///
    /// # Errors
    /// Returns `Error::Template` for unknown generators, malformed placeholders
    /// or malformed `generate` directives.
    pub fn expand(&self, template: &Value) -> Result<Value> {
        let expanded = self.rng.with(|rng| {
            let mut expander = Expander {
                ctx: GenerationContext {
                    rng,
                    anchor: self.anchor,
                },
                max_generate_count: self.max_generate_count,
            };
            expander.value(template)
        })??;
        Ok(expanded)
    }

    /// Expand a stored response's body and header values.
    ///
    /// Responses without template constructs are cloned without touching the
    /// random source.
    ///
    /// # Errors
    /// Same conditions as [`TemplateProcessor::expand`].
    pub fn expand_response(&self, response: &MockResponse) -> Result<MockResponse> {
        let headers_templated = response
            .headers
            .values()
            .any(|value| placeholder::has_placeholder(value));
        if !headers_templated && !Self::is_templated(&response.data) {
            return Ok(response.clone());
        }

        let expanded = self.rng.with(|rng| {
            let mut expander = Expander {
                ctx: GenerationContext {
                    rng,
                    anchor: self.anchor,
                },
                max_generate_count: self.max_generate_count,
            };
            let data = expander.value(&response.data)?;
            let mut headers = response.headers.clone();
            for value in headers.values_mut() {
                *value = expander.interpolate(value)?;
            }
            Ok::<_, TemplateError>(MockResponse {
                status: response.status,
                data,
                delay_ms: response.delay_ms,
                headers,
            })
        })??;
        Ok(expanded)
    }
}

fn is_directive(map: &Map<String, Value>) -> Option<&Value> {
    if map.len() == 1 {
        map.get(GENERATE_KEY)
    } else {
        None
    }
}

struct Expander<'rng> {
    ctx: GenerationContext<'rng>,
    max_generate_count: usize,
}

impl Expander<'_> {
    fn value(&mut self, template: &Value) -> core::result::Result<Value, TemplateError> {
        match template {
            Value::String(text) if placeholder::has_placeholder(text) => self.string(text),
            Value::Array(items) => items
                .iter()
                .map(|item| self.value(item))
                .collect::<core::result::Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                if let Some(body) = is_directive(map) {
                    return self.directive(body);
                }
                let mut expanded = Map::with_capacity(map.len());
                for (key, child) in map {
                    expanded.insert(key.clone(), self.value(child)?);
                }
                Ok(Value::Object(expanded))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(template.clone())
            }
        }
    }

    /// A lone placeholder keeps the generator's type; anything else becomes text.
    fn string(&mut self, text: &str) -> core::result::Result<Value, TemplateError> {
        let pieces = placeholder::parse(text)?;
        if let [Piece::Call(call)] = pieces.as_slice() {
            return call.generator.generate(&call.args, &mut self.ctx);
        }
        self.render(&pieces).map(Value::String)
    }

    fn interpolate(&mut self, text: &str) -> core::result::Result<String, TemplateError> {
        let pieces = placeholder::parse(text)?;
        self.render(&pieces)
    }

    fn render(&mut self, pieces: &[Piece]) -> core::result::Result<String, TemplateError> {
        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Literal(literal) => out.push_str(literal),
                Piece::Call(call) => match call.generator.generate(&call.args, &mut self.ctx)? {
                    Value::String(generated) => out.push_str(&generated),
                    other => out.push_str(&other.to_string()),
                },
            }
        }
        Ok(out)
    }

    fn directive(&mut self, body: &Value) -> core::result::Result<Value, TemplateError> {
        let Value::Object(fields) = body else {
            return Err(TemplateError::MalformedDirective(
                "`generate` must be an object with `count` and `template`".to_owned(),
            ));
        };
        if let Some(unexpected) = fields
            .keys()
            .find(|key| !matches!(key.as_str(), "count" | "template"))
        {
            return Err(TemplateError::MalformedDirective(format!(
                "unexpected key `{unexpected}`"
            )));
        }
        let count_value = fields
            .get("count")
            .ok_or_else(|| TemplateError::MalformedDirective("missing `count`".to_owned()))?;
        let template = fields
            .get("template")
            .ok_or_else(|| TemplateError::MalformedDirective("missing `template`".to_owned()))?;

        let count = self.count(count_value)?;
        if count > u64::try_from(self.max_generate_count).unwrap_or(u64::MAX) {
            return Err(TemplateError::GenerateLimitExceeded {
                requested: count,
                limit: self.max_generate_count,
            });
        }
        tracing::trace!("Expanding generate directive with {count} rows");

        (0..count)
            .map(|_| self.value(template))
            .collect::<core::result::Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// `count` may itself be a placeholder such as `{{number.int(1,5)}}`.
    fn count(&mut self, count_value: &Value) -> core::result::Result<u64, TemplateError> {
        let resolved = match count_value {
            Value::String(text) => self.string(text)?,
            other => other.clone(),
        };
        match &resolved {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
        .ok_or_else(|| {
            TemplateError::MalformedDirective(format!(
                "`count` must be a non-negative integer, got {resolved}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_core::Error;
    use mirage_deps::serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_bulk_generation_produces_distinct_ids() {
        let processor = TemplateProcessor::with_seed(11);
        let expanded = processor
            .expand(&json!({ "generate": { "count": 5, "template": { "id": "{{uuid}}" } } }))
            .unwrap();
        let rows = expanded.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        let ids: HashSet<&str> = rows.iter().filter_map(|row| row["id"].as_str()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_same_seed_same_output() {
        let template = json!({
            "user": { "name": "{{person.fullName}}", "age": "{{number.int(18, 90)}}" },
            "tags": ["{{lorem.sentence(3)}}", "static"]
        });
        let first = TemplateProcessor::with_seed(3).expand(&template).unwrap();
        let second = TemplateProcessor::with_seed(3).expand(&template).unwrap();
        assert_eq!(first, second);
        assert!(first["user"]["age"].is_i64());
        assert_eq!(first["tags"][1], "static");
    }

    #[test]
    fn test_repeated_expansion_advances_the_session() {
        let processor = TemplateProcessor::with_seed(3);
        let template = json!("{{uuid}}");
        let first = processor.expand(&template).unwrap();
        let second = processor.expand(&template).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_embedded_placeholder_becomes_text() {
        let processor = TemplateProcessor::with_seed(8);
        let value = processor.expand(&json!("item-{{number.int(5, 5)}}")).unwrap();
        assert_eq!(value, json!("item-5"));
    }

    #[test]
    fn test_unknown_generator_surfaces_as_template_error() {
        let processor = TemplateProcessor::with_seed(1);
        let err = processor
            .expand(&json!({ "name": "{{person.nickname}}" }))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::UnknownGenerator(ref name)) if name == "person.nickname"
        ));
    }

    #[test]
    fn test_malformed_directives() {
        let processor = TemplateProcessor::with_seed(1);
        for bad in [
            json!({ "generate": 3 }),
            json!({ "generate": { "template": {} } }),
            json!({ "generate": { "count": 2 } }),
            json!({ "generate": { "count": -1, "template": {} } }),
            json!({ "generate": { "count": 1.5, "template": {} } }),
            json!({ "generate": { "count": 2, "template": {}, "extra": true } }),
        ] {
            let err = processor.expand(&bad).unwrap_err();
            assert!(
                matches!(err, Error::Template(TemplateError::MalformedDirective(_))),
                "expected malformed directive for {bad}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_generate_limit() {
        let processor = TemplateProcessor::new(&SessionConfig {
            seed: Some(1),
            max_generate_count: 3,
        });
        let err = processor
            .expand(&json!({ "generate": { "count": 4, "template": 1 } }))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Template(TemplateError::GenerateLimitExceeded { requested: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_count_may_be_a_placeholder_and_zero_is_empty() {
        let processor = TemplateProcessor::with_seed(2);
        let rows = processor
            .expand(&json!({ "generate": { "count": "{{number.int(2, 2)}}", "template": "x" } }))
            .unwrap();
        assert_eq!(rows, json!(["x", "x"]));

        let none = processor
            .expand(&json!({ "generate": { "count": 0, "template": "{{uuid}}" } }))
            .unwrap();
        assert_eq!(none, json!([]));
    }

    #[test]
    fn test_object_with_generate_and_other_keys_is_plain_data() {
        let processor = TemplateProcessor::with_seed(2);
        let value = json!({ "generate": "yes", "other": 1 });
        assert!(!TemplateProcessor::is_templated(&value));
        assert_eq!(processor.expand(&value).unwrap(), value);
    }

    #[test]
    fn test_nested_directives() {
        let processor = TemplateProcessor::with_seed(4);
        let value = processor
            .expand(&json!({
                "generate": {
                    "count": 2,
                    "template": {
                        "children": { "generate": { "count": 3, "template": "{{uuid}}" } }
                    }
                }
            }))
            .unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["children"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_expand_response_leaves_plain_responses_alone() {
        let processor = TemplateProcessor::with_seed(4);
        let plain = MockResponse::ok(json!([])).with_delay(20);
        assert_eq!(processor.expand_response(&plain).unwrap(), plain);

        let templated = MockResponse::ok(json!({ "id": "{{uuid}}" }))
            .with_header("x-request-id", "req-{{number.int(7, 7)}}");
        let expanded = processor.expand_response(&templated).unwrap();
        assert!(expanded.data["id"].as_str().is_some_and(|id| !id.contains("{{")));
        assert_eq!(
            expanded.headers.get("x-request-id").map(String::as_str),
            Some("req-7")
        );
        assert_eq!(templated.data["id"], "{{uuid}}");
    }
}
