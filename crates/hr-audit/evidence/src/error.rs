use hr_audit_types::AuditError;

/// Errors from building or verifying evidence records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvidenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid parent hash `{0}`: expected 64 lowercase hex digits")]
    InvalidParentHash(String),
    #[error("record {index} tampered: stored {stored}, computed {computed}")]
    RecordTampered {
        index: usize,
        stored: String,
        computed: String,
    },
    #[error("record {index} has a broken chain link: expected parent {expected}, found {found}")]
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("record {index} is malformed: {message}")]
    Malformed { index: usize, message: String },
}

impl From<serde_json::Error> for EvidenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Verification failures are integrity errors. Failures while building a
/// record are execution errors: nothing stored was found wrong.
impl From<EvidenceError> for AuditError {
    fn from(e: EvidenceError) -> Self {
        match e {
            EvidenceError::Serialization(_) | EvidenceError::InvalidParentHash(_) => {
                AuditError::io("evidence build", e.to_string())
            }
            EvidenceError::RecordTampered { .. }
            | EvidenceError::BrokenLink { .. }
            | EvidenceError::Malformed { .. } => AuditError::integrity(e.to_string()),
        }
    }
}
