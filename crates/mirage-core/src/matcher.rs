//! Matching concrete requests against endpoint patterns.

use crate::endpoint::{EndpointKey, PathSegment};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Values captured by `:name` segments, keyed by parameter name.
pub type PathParams = BTreeMap<String, String>;

/// An intercepted API call, split once so every pattern test reuses the segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiRequest {
    method: String,
    path: String,
    #[serde(skip)]
    segments: Vec<String>,
}

impl ApiRequest {
    /// Describe a request. Any query string or fragment on `path` is ignored.
    pub fn new(method: &str, path: &str) -> Self {
        let bare = path
            .split_once(['?', '#'])
            .map_or(path, |(before, _)| before);
        let trimmed = bare.strip_prefix('/').unwrap_or(bare);
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(ToOwned::to_owned).collect()
        };

        Self {
            method: method.trim().to_ascii_uppercase(),
            path: bare.to_owned(),
            segments,
        }
    }

    /// Upper-cased method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path without query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Test `request` against `pattern`.
///
/// Methods compare case-insensitively; segment counts must be equal; literal
/// segments compare exactly and `:name` segments bind any non-empty segment.
/// Returns `None` on mismatch, never an error.
pub fn matches(pattern: &EndpointKey, request: &ApiRequest) -> Option<PathParams> {
    if !pattern.method().eq_ignore_ascii_case(request.method()) {
        return None;
    }
    if pattern.segments().len() != request.segments().len() {
        return None;
    }

    let mut params = PathParams::new();
    for (expected, actual) in pattern.segments().iter().zip(request.segments()) {
        match expected {
            PathSegment::Literal(literal) => {
                if literal != actual {
                    return None;
                }
            }
            PathSegment::Param(name) => {
                if actual.is_empty() {
                    return None;
                }
                params.insert(name.clone(), actual.clone());
            }
        }
    }
    Some(params)
}
