//! The thirteen-section evidence record.

use crate::canonical::record_hash;
use crate::error::EvidenceError;
use chrono::{DateTime, Utc};
use hr_audit_types::{
    CriterionId, EvaluationResult, MitigationAction, ScenarioId, ScoringTrace, TestCase,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: &str = "annexIII4_evidence_v1.0";
pub const HASH_ALGORITHM: &str = "SHA-256";
/// Parent hash of the first record in a scenario log.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryScope {
    pub eu_ai_act_annex: String,
    pub risk_category: String,
    pub applicable_articles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSection {
    pub scenario_id: ScenarioId,
    pub title: String,
    pub description: String,
    pub objective: String,
    pub scenario_type: String,
    pub tags: Vec<String>,
    pub regulatory_scope: RegulatoryScope,
}

/// Who ran what, where and when. The timestamp is supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_id: String,
    pub timestamp: DateTime<Utc>,
    pub executed_by: String,
    pub execution_environment: String,
}

impl ExecutionContext {
    /// Fresh execution id, stamped now.
    pub fn new(executed_by: impl Into<String>, execution_environment: impl Into<String>) -> Self {
        Self::at(Utc::now(), executed_by, execution_environment)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        executed_by: impl Into<String>,
        execution_environment: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: format!("EXEC-{}", uuid::Uuid::new_v4()),
            timestamp,
            executed_by: executed_by.into(),
            execution_environment: execution_environment.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemUnderTest {
    pub system_id: String,
    pub system_name: String,
    pub system_version: String,
    pub system_type: String,
    pub vendor: String,
    pub deployment_mode: String,
    pub endpoint: String,
    pub model_family: String,
    pub capabilities: Vec<String>,
}

impl Default for SystemUnderTest {
    fn default() -> Self {
        Self {
            system_id: "hr-scoring-simulator".to_string(),
            system_name: "Biased HR Scoring Simulator".to_string(),
            system_version: "1.0.0".to_string(),
            system_type: "candidate_scoring".to_string(),
            vendor: "internal".to_string(),
            deployment_mode: "local".to_string(),
            endpoint: "http://localhost:8000/api/v1/score".to_string(),
            model_family: "rule_based".to_string(),
            capabilities: vec![
                "candidate_scoring".to_string(),
                "bias_simulation".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationStack {
    pub stack_id: String,
    pub scenario_catalog_id: String,
    pub criteria_config_id: String,
    pub mitigation_config_id: String,
    pub scoring_config_id: String,
}

impl Default for ConfigurationStack {
    fn default() -> Self {
        Self {
            stack_id: "hr-audit-standard".to_string(),
            scenario_catalog_id: "standard-catalog-v1".to_string(),
            criteria_config_id: "standard-criteria-v1".to_string(),
            mitigation_config_id: "standard-mitigation-v1".to_string(),
            scoring_config_id: "skills-base-v1".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub step_id: u32,
    pub action: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub result_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActualResults {
    pub computed_metrics: BTreeMap<String, f64>,
    pub scoring_trace: ScoringTrace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_pass(scenario_pass: bool) -> Self {
        if scenario_pass {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSection {
    pub overall_result: Verdict,
    pub criteria_evaluations: Vec<EvaluationResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessEvidence {
    pub summary: String,
    pub criteria_passed: Vec<CriterionId>,
    pub metrics_within_bounds: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvidence {
    pub summary: String,
    pub detected_violations: Vec<String>,
    pub article_violations: Vec<String>,
    pub failed_criteria: Vec<CriterionId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationSection {
    pub mitigation_required: bool,
    pub status: String,
    pub template_id: Option<String>,
    pub plan: String,
    pub actions: Vec<MitigationAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub parent_hash: String,
    pub record_hash: String,
    pub algorithm: String,
}

/// The persisted audit unit. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub schema_version: String,
    pub scenario: ScenarioSection,
    pub test_case: TestCase,
    pub execution_context: ExecutionContext,
    pub system_under_test: SystemUnderTest,
    pub configuration_stack: ConfigurationStack,
    pub test_steps_executed: Vec<TestStep>,
    pub actual_results: ActualResults,
    pub evaluation: EvaluationSection,
    pub success_evidence: Option<SuccessEvidence>,
    pub failure_evidence: Option<FailureEvidence>,
    pub mitigation: Option<MitigationSection>,
    pub provenance: Provenance,
}

impl EvidenceRecord {
    /// Every section except `provenance`, as JSON.
    pub fn hashed_sections(&self) -> Result<Value, EvidenceError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("provenance");
        }
        Ok(value)
    }

    /// Recompute the record hash from the sections and the stored parent hash.
    pub fn compute_hash(&self) -> Result<String, EvidenceError> {
        record_hash(&self.hashed_sections()?, &self.provenance.parent_hash)
    }

    pub fn record_hash(&self) -> &str {
        &self.provenance.record_hash
    }

    pub fn parent_hash(&self) -> &str {
        &self.provenance.parent_hash
    }

    pub fn passed(&self) -> bool {
        self.evaluation.overall_result == Verdict::Pass
    }

    pub fn to_json_line(&self) -> Result<String, EvidenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_line(line: &str) -> Result<Self, EvidenceError> {
        Ok(serde_json::from_str(line)?)
    }
}

pub(crate) fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
