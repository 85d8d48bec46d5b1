//! Endpoint keys of the form `METHOD /path/:param`.
//!
//! The canonical string form is what callers write and what maps are keyed
//! on; the parsed segment list is kept alongside it so matching never has to
//! re-split the template.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Must equal the request segment exactly
    Literal(String),
    /// `:name`, captures any non-empty request segment
    Param(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Param(name) => write!(f, ":{name}"),
        }
    }
}

/// A parsed `(method, path-template)` pair.
///
/// Equality, ordering and hashing all go through the canonical string, so
/// `get /items` and `GET /items` are the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointKey {
    method: String,
    segments: Vec<PathSegment>,
    canonical: String,
}

impl EndpointKey {
    /// Parse `"METHOD /path"`.
    ///
    /// # Errors
    /// Returns `Error::Validation` when the method or path is missing, and
    /// `Error::Pattern` when the path template is structurally invalid.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let Some((method, path)) = trimmed.split_once(char::is_whitespace) else {
            return Err(Error::Validation(format!(
                "endpoint key {text:?} must look like `METHOD /path`"
            )));
        };
        Self::from_parts(method, path.trim()).map_err(|err| match err {
            Error::Pattern { reason, .. } => Error::Pattern {
                endpoint: text.to_owned(),
                reason,
            },
            other => other,
        })
    }

    /// Build a key from a method and a path template.
    ///
    /// # Errors
    /// Same conditions as [`EndpointKey::parse`].
    pub fn from_parts(method: &str, path: &str) -> Result<Self> {
        let method = Self::normalize_method(method)?;
        let segments = Self::parse_template(method.as_str(), path)?;
        let canonical = format!("{method} {}", render_path(&segments));
        Ok(Self {
            method,
            segments,
            canonical,
        })
    }

    fn normalize_method(method: &str) -> Result<String> {
        if method.is_empty() || !method.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(Error::Validation(format!(
                "HTTP method {method:?} must be a non-empty alphabetic token"
            )));
        }
        Ok(method.to_ascii_uppercase())
    }

    fn parse_template(method: &str, path: &str) -> Result<Vec<PathSegment>> {
        let reject = |reason: &str| Error::Pattern {
            endpoint: format!("{method} {path}"),
            reason: reason.to_owned(),
        };

        let Some(rest) = path.strip_prefix('/') else {
            return Err(reject("path must start with `/`"));
        };
        if path.contains(['?', '#']) || path.contains(char::is_whitespace) {
            return Err(reject("path template may not contain a query, fragment or spaces"));
        }
        if rest.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen_params = HashSet::new();
        rest.split('/')
            .map(|segment| {
                if segment.is_empty() {
                    return Err(reject("empty path segment"));
                }
                let Some(name) = segment.strip_prefix(':') else {
                    return Ok(PathSegment::Literal(segment.to_owned()));
                };
                if name.is_empty() {
                    return Err(reject("parameter segment has no name"));
                }
                if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                    return Err(reject(&format!("parameter name {name:?} is not an identifier")));
                }
                if !seen_params.insert(name.to_owned()) {
                    return Err(reject(&format!("parameter {name:?} appears twice")));
                }
                Ok(PathSegment::Param(name.to_owned()))
            })
            .collect()
    }

    /// Upper-cased HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parsed path template
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Canonical `"METHOD /path"` form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Number of literal segments; more literal keys win over looser ones.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, PathSegment::Literal(_)))
            .count()
    }

    /// Names of the `:param` segments in path order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            PathSegment::Param(name) => Some(name.as_str()),
            PathSegment::Literal(_) => None,
        })
    }
}

fn render_path(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "/".to_owned();
    }
    segments.iter().fold(String::new(), |mut path, segment| {
        path.push('/');
        path.push_str(&segment.to_string());
        path
    })
}

impl PartialEq for EndpointKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for EndpointKey {}

impl Hash for EndpointKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for EndpointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EndpointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for EndpointKey {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl TryFrom<String> for EndpointKey {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

impl From<EndpointKey> for String {
    fn from(key: EndpointKey) -> Self {
        key.canonical
    }
}
