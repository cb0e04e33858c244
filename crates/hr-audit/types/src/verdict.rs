use crate::catalog::Severity;
use crate::ids::CriterionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict for one criterion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub criterion_id: CriterionId,
    pub passed: bool,
    /// Metric value the expression was checked against (occurrence count for
    /// violation-absence checks).
    pub actual_value: f64,
    pub expected_outcome: bool,
    pub severity: Severity,
    /// Rendered expression, e.g. `ViolationCount == 0`.
    pub expression: String,
}

/// Ordered per-criterion verdicts plus the aggregate scenario verdict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEvaluation {
    pub results: Vec<EvaluationResult>,
    pub scenario_pass: bool,
}

impl ScenarioEvaluation {
    /// Required criteria that did not pass, in configured order.
    pub fn failed_required(&self) -> impl Iterator<Item = &EvaluationResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Required && !r.passed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationAction {
    pub action_id: String,
    pub action: String,
    pub owner: String,
    pub deadline: DateTime<Utc>,
}

/// Action items for a failing run. Empty for passing runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationPlan {
    /// Template the plan was filled from; `None` for an empty plan.
    pub template_id: Option<String>,
    pub summary: String,
    pub actions: Vec<MitigationAction>,
}

impl MitigationPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
