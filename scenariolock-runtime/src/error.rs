//! Error types for the ScenarioLock runtime

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by release callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Runtime errors
#[derive(Error, Debug)]
pub enum LockError {
    /// The context carries no token from this lock's before hook,
    /// or the token was already released by the after hook.
    #[error("missing scenario lock key in context")]
    MissingOwnerToken,

    /// One or more release callbacks failed during teardown
    #[error("{0}")]
    Release(ReleaseErrors),

    /// A timed acquire gave up waiting for another scenario
    #[error("timed out after {waited:?} waiting for resource {resource:?}")]
    Timeout { resource: String, waited: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LockError {
    /// True for the mis-wired scenario error
    pub fn is_missing_token(&self) -> bool {
        matches!(self, LockError::MissingOwnerToken)
    }

    /// Individual release failures, if this is a teardown error
    pub fn release_failures(&self) -> &[ReleaseFailure] {
        match self {
            LockError::Release(errors) => &errors.failures,
            _ => &[],
        }
    }
}

/// A single failed release callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub resource: String,
    pub message: String,
}

/// Release failures collected over one teardown pass
///
/// Displays as the individual messages joined by the configured separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseErrors {
    pub failures: Vec<ReleaseFailure>,
    separator: String,
}

impl ReleaseErrors {
    pub(crate) fn new(failures: Vec<ReleaseFailure>, separator: &str) -> Self {
        Self {
            failures,
            separator: separator.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ReleaseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(&self.separator)?;
            }
            f.write_str(&failure.message)?;
        }
        Ok(())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LockError>;
