use crate::catalog::TraceMetric;
use crate::ids::ScenarioId;
use serde::{Deserialize, Serialize};

/// One fired rule and how far it moved the score, in percent of the base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub rule_name: String,
    pub violation_code: String,
    pub delta: f64,
}

/// What the scoring engine produced for one profile.
///
/// `adjustments` follow catalog declaration order, never firing order.
/// `violation_codes` and `article_violations` are ordered and de-duplicated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringTrace {
    pub scenario_id: ScenarioId,
    pub base_score: f64,
    pub adjustments: Vec<AppliedAdjustment>,
    /// Always within `[0, 100]`.
    pub final_score: f64,
    pub violation_codes: Vec<String>,
    pub article_violations: Vec<String>,
    /// Rationale lines of the fired rules, in catalog order.
    pub reasoning: Vec<String>,
    /// Set when a bounded-random rule fired.
    pub nondeterministic: bool,
}

impl ScoringTrace {
    pub fn has_violations(&self) -> bool {
        !self.violation_codes.is_empty()
    }

    pub fn has_violation(&self, code: &str) -> bool {
        self.violation_codes.iter().any(|c| c == code)
    }

    pub fn metric(&self, metric: TraceMetric) -> f64 {
        match metric {
            TraceMetric::FinalScore => self.final_score,
            TraceMetric::BaseScore => self.base_score,
            TraceMetric::ViolationCount => self.violation_codes.len() as f64,
            TraceMetric::ArticleViolationCount => self.article_violations.len() as f64,
            TraceMetric::AdjustmentCount => self.adjustments.len() as f64,
            TraceMetric::ScoreRatio => {
                if self.base_score == 0.0 {
                    1.0
                } else {
                    self.final_score / self.base_score
                }
            }
        }
    }
}
