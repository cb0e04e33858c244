use hr_audit_types::{
    AuditResult, Criterion, CriterionExpression, EvaluationResult, ScenarioCatalog,
    ScenarioEvaluation, ScenarioId, ScoringTrace, Severity,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Evaluates a scenario's criteria against a scoring trace.
#[derive(Clone)]
pub struct CriteriaEvaluator {
    catalog: Arc<ScenarioCatalog>,
}

impl CriteriaEvaluator {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    /// Evaluate every criterion in configured order.
    ///
    /// The verdict is the conjunction of the required criteria; advisory
    /// results are reported but never flip it.
    pub fn evaluate(
        &self,
        scenario_id: &ScenarioId,
        trace: &ScoringTrace,
    ) -> AuditResult<ScenarioEvaluation> {
        let scenario = self.catalog.scenario(scenario_id)?;
        let criteria = self.catalog.criteria_for(scenario)?;

        let results: Vec<EvaluationResult> = criteria
            .into_iter()
            .map(|criterion| evaluate_criterion(criterion, trace))
            .collect();

        let scenario_pass = results
            .iter()
            .filter(|r| r.severity == Severity::Required)
            .all(|r| r.passed);

        info!(
            scenario_id = %scenario_id,
            criteria = results.len(),
            scenario_pass,
            "Criteria evaluated"
        );

        Ok(ScenarioEvaluation {
            results,
            scenario_pass,
        })
    }
}

fn evaluate_criterion(criterion: &Criterion, trace: &ScoringTrace) -> EvaluationResult {
    let (holds, actual_value) = match &criterion.expression {
        CriterionExpression::Compare {
            metric,
            operator,
            threshold,
        } => {
            let actual = trace.metric(*metric);
            (operator.apply(actual, *threshold), actual)
        }
        CriterionExpression::ViolationAbsent { code } => {
            let present = trace.has_violation(code);
            (!present, if present { 1.0 } else { 0.0 })
        }
    };
    let passed = holds == criterion.expected_outcome;

    debug!(criterion = %criterion.id, passed, actual_value, "Criterion checked");

    EvaluationResult {
        criterion_id: criterion.id.clone(),
        passed,
        actual_value,
        expected_outcome: criterion.expected_outcome,
        severity: criterion.severity,
        expression: criterion.expression.describe(),
    }
}
