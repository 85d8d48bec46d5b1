//! Integration test framework for Mirage
//!
//! Provides JSON-driven end-to-end cases combining:
//! - Fixture and scenario registration
//! - Activation routes, overrides and toggles
//! - Request resolution through an async transport that honours delays

#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

pub mod case;
pub mod case_loader;
pub mod runner;
pub mod transport;
pub mod verification_result;

pub use case::{CaseStep, Expectation, StepAction, TestCase};
pub use case_loader::{discover_cases, load_case};
pub use runner::CaseRunner;
pub use transport::{Backend, Exchange, MockTransport, RecordingBackend};
pub use verification_result::VerificationResult;
