//! Candidate profile sources.

use async_trait::async_trait;
use hr_audit_types::{AuditError, AuditResult, CandidateProfile};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Source of candidate profiles.
///
/// Implementations are created per run or per process and passed in
/// explicitly; there is no shared global store.
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn fetch(&self, candidate_id: &str) -> AuditResult<CandidateProfile>;
}

/// In-memory repository keyed by candidate id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateRepository {
    candidates: HashMap<String, CandidateProfile>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, candidate_id: impl Into<String>, profile: CandidateProfile) -> Self {
        self.insert(candidate_id, profile);
        self
    }

    pub fn insert(&mut self, candidate_id: impl Into<String>, profile: CandidateProfile) {
        self.candidates.insert(candidate_id.into(), profile);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Load a JSON object mapping candidate ids to profiles.
    pub async fn from_json_file(path: &Path) -> AuditResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuditError::io("read candidate file", e.to_string()))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| AuditError::validation(format!("invalid candidate file: {}", e)))?;
        let Value::Object(entries) = value else {
            return Err(AuditError::validation(
                "candidate file must map candidate ids to profiles",
            ));
        };

        let mut repository = Self::new();
        for (candidate_id, profile) in entries {
            repository.insert(candidate_id, CandidateProfile::from_value(profile)?);
        }
        Ok(repository)
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn fetch(&self, candidate_id: &str) -> AuditResult<CandidateProfile> {
        self.candidates.get(candidate_id).cloned().ok_or_else(|| {
            AuditError::io(
                "candidate profile retrieval",
                format!("no profile for candidate `{}`", candidate_id),
            )
        })
    }
}
