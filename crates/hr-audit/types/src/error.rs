use std::time::Duration;
use thiserror::Error;

/// Result type for every pipeline entry point.
pub type AuditResult<T> = Result<T, AuditError>;

/// Failure kinds surfaced by the scoring, evaluation and evidence pipeline.
///
/// All of them abort the current run; none of them is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    /// The candidate profile lacks a field the scenario needs for scoring.
    #[error("validation error: {0}")]
    Validation(String),

    /// A scenario references an undefined rule, criterion or mitigation template.
    #[error("config error: {0}")]
    Config(String),

    /// External I/O (profile retrieval, log append) failed or timed out.
    #[error("execution error: {0}")]
    Execution(ExecutionFailure),

    /// A stored record does not match a recomputation of its own hash.
    #[error("integrity error: {0}")]
    Integrity(String),
}

/// Cause of an [`AuditError::Execution`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("{operation} failed: {message}")]
    Io { operation: String, message: String },
}

impl AuditError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Execution(ExecutionFailure::Timeout {
            operation: operation.into(),
            timeout,
        })
    }

    pub fn io(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution(ExecutionFailure::Io {
            operation: operation.into(),
            message: message.into(),
        })
    }

    /// Stable lowercase label, used in logs and run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Execution(_) => "execution",
            Self::Integrity(_) => "integrity",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Execution(ExecutionFailure::Timeout { .. }))
    }
}
