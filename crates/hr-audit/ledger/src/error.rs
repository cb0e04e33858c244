use hr_audit_types::AuditError;
use std::time::Duration;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-layer errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{operation} failed: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("log for `{scenario_id}` is corrupt at line {line}: {message}")]
    Corrupt {
        scenario_id: String,
        line: usize,
        message: String,
    },

    #[error("append rejected: record parent {found} does not extend head {expected}")]
    ChainConflict { expected: String, found: String },

    #[error("invalid scenario id for a log name: `{0}`")]
    InvalidScenarioId(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<LedgerError> for AuditError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Timeout {
                operation,
                timeout,
            } => AuditError::timeout(operation, timeout),
            LedgerError::Corrupt { .. } | LedgerError::ChainConflict { .. } => {
                AuditError::integrity(e.to_string())
            }
            LedgerError::InvalidScenarioId(_) => AuditError::config(e.to_string()),
            LedgerError::Io { operation, .. } => AuditError::io(operation, e.to_string()),
            LedgerError::Serialization(_) | LedgerError::Backend(_) => {
                AuditError::io("evidence log", e.to_string())
            }
        }
    }
}
