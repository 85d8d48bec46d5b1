//! Async request interceptor in front of a real backend.
//!
//! Resolution itself never sleeps; the transport is where a mocked
//! response's `delay_ms` turns into wall-clock (or paused tokio) time.

use async_trait::async_trait;
use mirage_core::{ApiRequest, Error, MockResponse, Result};
use mirage_deps::serde_json::json;
use mirage_deps::tracing;
use mirage_engine::{MockController, Resolution};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant, sleep};

/// Where pass-through requests go.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Perform the real call
    ///
    /// # Errors
    /// Returns an error if the backend cannot answer
    async fn send(&self, request: &ApiRequest) -> Result<MockResponse>;
}

/// Backend that answers every call with its own description and remembers it
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<String>>,
}

impl RecordingBackend {
    /// Backend with no recorded calls
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far, as `METHOD /path`
    ///
    /// # Errors
    /// Returns an error if the call log lock is poisoned
    pub fn calls(&self) -> Result<Vec<String>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .map_err(|err| Error::Other(format!("Lock poisoned: {err}")))
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn send(&self, request: &ApiRequest) -> Result<MockResponse> {
        self.calls
            .lock()
            .map_err(|err| Error::Other(format!("Lock poisoned: {err}")))?
            .push(request.to_string());
        Ok(MockResponse::ok(json!({
            "backend": true,
            "method": request.method(),
            "path": request.path(),
        })))
    }
}

/// One completed request
#[derive(Debug, Clone)]
pub struct Exchange {
    /// What the caller received
    pub response: MockResponse,
    /// How the engine decided
    pub resolution: Resolution,
    /// Time between sending and receiving
    pub elapsed: Duration,
}

impl Exchange {
    /// Whether the engine answered instead of the backend
    pub fn mocked(&self) -> bool {
        self.resolution.is_short_circuit()
    }
}

/// Routes each request through the controller, falling back to `backend`
pub struct MockTransport<B> {
    controller: Arc<MockController>,
    backend: B,
}

impl<B: Backend> MockTransport<B> {
    /// Transport over a shared controller
    pub fn new(controller: Arc<MockController>, backend: B) -> Self {
        Self {
            controller,
            backend,
        }
    }

    /// Controller the transport consults
    pub fn controller(&self) -> &MockController {
        &self.controller
    }

    /// Backend that receives pass-through requests
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send one request
    ///
    /// # Errors
    /// Returns resolution errors and backend failures
    pub async fn fetch(&self, request: &ApiRequest) -> Result<Exchange> {
        let start = Instant::now();
        let resolution = self.controller.resolve(request)?;

        let response = if let Some(mocked) = resolution.decision.response() {
            if mocked.delay_ms > 0 {
                tracing::debug!("Delaying {request} by {}ms", mocked.delay_ms);
                sleep(Duration::from_millis(mocked.delay_ms)).await;
            }
            mocked.clone()
        } else {
            self.backend.send(request).await?
        };

        Ok(Exchange {
            response,
            resolution,
            elapsed: start.elapsed(),
        })
    }
}
