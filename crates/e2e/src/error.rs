//! Error types for E2E testing

use thiserror::Error;

use crate::check::AssertionFailure;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Setup timeout: '{selector}' not visible after {timeout_ms} ms")]
    SetupTimeout { selector: String, timeout_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailed(AssertionFailure),

    #[error("Unknown case kind: {0}")]
    UnknownKind(String),

    #[error("Duplicate case id: {0}")]
    DuplicateCaseId(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Playwright driver exited unexpectedly")]
    DriverClosed,

    #[error("Target {url} unreachable: {reason}")]
    TargetUnreachable { url: String, reason: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid filter: {0}")]
    Regex(#[from] regex::Error),
}

impl From<AssertionFailure> for E2eError {
    fn from(failure: AssertionFailure) -> Self {
        E2eError::AssertionFailed(failure)
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
