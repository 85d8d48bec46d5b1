//! Synthetic responses and their protocol-tagged stored form.

use crate::error::{Error, Result};
use mirage_deps::serde_json::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const fn default_status() -> u16 {
    200
}

/// A synthetic HTTP response.
///
/// `delay_ms` is returned to the caller, never slept on by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockResponse {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,
    /// Response body; may contain placeholders until expanded
    #[serde(default)]
    pub data: Value,
    /// Latency the caller should inject before completing the call
    #[serde(default, alias = "delay")]
    pub delay_ms: u64,
    /// Extra response headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl MockResponse {
    /// Response with the given status and body, no delay or headers
    #[must_use]
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            delay_ms: 0,
            headers: BTreeMap::new(),
        }
    }

    /// 200 response with the given body
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::new(default_status(), data)
    }

    /// Set the injected latency
    #[must_use]
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Add a response header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check the status code is a real HTTP status.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the status is outside `100..=599`.
    pub fn validate(&self) -> Result<()> {
        if (100..=599).contains(&self.status) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "status {} is not a valid HTTP status code",
                self.status
            )))
        }
    }
}

/// A stored response, tagged by the protocol it answers.
///
/// Only request/response exists today; streaming protocols slot in as new
/// variants without touching the resolution tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum ResponseKind {
    /// One request, one response
    RequestResponse(MockResponse),
}

impl ResponseKind {
    /// Short protocol name for diagnostics
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::RequestResponse(_) => "request_response",
        }
    }

    /// Validate the wrapped payload.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the payload is invalid.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::RequestResponse(response) => response.validate(),
        }
    }
}

impl From<MockResponse> for ResponseKind {
    fn from(response: MockResponse) -> Self {
        Self::RequestResponse(response)
    }
}
