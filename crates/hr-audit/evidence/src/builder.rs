use crate::canonical::record_hash;
use crate::error::EvidenceError;
use crate::record::{
    is_valid_hash, ActualResults, ConfigurationStack, EvaluationSection, EvidenceRecord,
    ExecutionContext, FailureEvidence, MitigationSection, Provenance, RegulatoryScope,
    ScenarioSection, SuccessEvidence, SystemUnderTest, TestStep, Verdict, HASH_ALGORITHM,
    SCHEMA_VERSION,
};
use hr_audit_types::{
    MitigationPlan, Scenario, ScenarioEvaluation, ScoringTrace, Severity, TestCase, TraceMetric,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything one run contributes to its evidence record.
#[derive(Clone, Copy, Debug)]
pub struct EvidenceInput<'a> {
    pub scenario: &'a Scenario,
    pub test_case: &'a TestCase,
    pub execution_context: &'a ExecutionContext,
    pub trace: &'a ScoringTrace,
    pub evaluation: &'a ScenarioEvaluation,
    pub mitigation_plan: &'a MitigationPlan,
    /// Hash of the previous record in the scenario log, or the genesis hash.
    pub prior_hash: &'a str,
}

/// Assembles evidence records. Pure: no I/O, no clock reads.
#[derive(Clone, Debug, Default)]
pub struct EvidenceBuilder {
    system_under_test: SystemUnderTest,
    configuration_stack: ConfigurationStack,
}

impl EvidenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_under_test(mut self, system: SystemUnderTest) -> Self {
        self.system_under_test = system;
        self
    }

    pub fn with_configuration_stack(mut self, stack: ConfigurationStack) -> Self {
        self.configuration_stack = stack;
        self
    }

    /// Build a sealed record.
    ///
    /// A passing run gets `success_evidence`; a failing run gets
    /// `failure_evidence` and `mitigation`. Never both.
    pub fn build(&self, input: EvidenceInput<'_>) -> Result<EvidenceRecord, EvidenceError> {
        if !is_valid_hash(input.prior_hash) {
            return Err(EvidenceError::InvalidParentHash(input.prior_hash.to_string()));
        }

        let scenario_pass = input.evaluation.scenario_pass;
        let computed_metrics = computed_metrics(input.trace);

        let (success_evidence, failure_evidence, mitigation) = if scenario_pass {
            (Some(success_section(input, &computed_metrics)), None, None)
        } else {
            (
                None,
                Some(failure_section(input)),
                Some(mitigation_section(input.mitigation_plan)),
            )
        };

        let mut record = EvidenceRecord {
            schema_version: SCHEMA_VERSION.to_string(),
            scenario: scenario_section(input.scenario),
            test_case: input.test_case.clone(),
            execution_context: input.execution_context.clone(),
            system_under_test: self.system_under_test.clone(),
            configuration_stack: self.configuration_stack.clone(),
            test_steps_executed: test_steps(input),
            actual_results: ActualResults {
                computed_metrics,
                scoring_trace: input.trace.clone(),
            },
            evaluation: EvaluationSection {
                overall_result: Verdict::from_pass(scenario_pass),
                criteria_evaluations: input.evaluation.results.clone(),
            },
            success_evidence,
            failure_evidence,
            mitigation,
            provenance: Provenance {
                parent_hash: input.prior_hash.to_string(),
                record_hash: String::new(),
                algorithm: HASH_ALGORITHM.to_string(),
            },
        };

        record.provenance.record_hash = record_hash(&record.hashed_sections()?, input.prior_hash)?;

        debug!(
            scenario_id = %input.scenario.scenario_id,
            execution_id = %input.execution_context.execution_id,
            record_hash = %record.provenance.record_hash,
            "Evidence record built"
        );

        Ok(record)
    }
}

fn scenario_section(scenario: &Scenario) -> ScenarioSection {
    ScenarioSection {
        scenario_id: scenario.scenario_id.clone(),
        title: scenario.title.clone(),
        description: scenario.description.clone(),
        objective: scenario.objective.clone(),
        scenario_type: scenario.scenario_type.clone(),
        tags: scenario.tags.clone(),
        regulatory_scope: RegulatoryScope {
            eu_ai_act_annex: "III-4".to_string(),
            risk_category: "high-risk".to_string(),
            applicable_articles: scenario.applicable_articles.clone(),
        },
    }
}

const METRICS: [(&str, TraceMetric); 6] = [
    ("final_score", TraceMetric::FinalScore),
    ("base_score", TraceMetric::BaseScore),
    ("violation_count", TraceMetric::ViolationCount),
    ("article_violation_count", TraceMetric::ArticleViolationCount),
    ("adjustment_count", TraceMetric::AdjustmentCount),
    ("score_ratio", TraceMetric::ScoreRatio),
];

fn computed_metrics(trace: &ScoringTrace) -> BTreeMap<String, f64> {
    METRICS
        .iter()
        .map(|(name, metric)| (name.to_string(), trace.metric(*metric)))
        .collect()
}

fn test_steps(input: EvidenceInput<'_>) -> Vec<TestStep> {
    let at = input.execution_context.timestamp;
    let trace = input.trace;
    let evaluation = input.evaluation;
    let mut steps = vec![
        ("Load candidate profile".to_string(), "Profile accepted".to_string()),
        (
            format!("Score profile against {} rules", input.scenario.rules.len()),
            format!(
                "Base {:.2}, final {:.2}, {} violation(s)",
                trace.base_score,
                trace.final_score,
                trace.violation_codes.len()
            ),
        ),
        (
            format!("Evaluate {} criteria", evaluation.results.len()),
            format!(
                "{} passed, verdict {}",
                evaluation.results.iter().filter(|r| r.passed).count(),
                if evaluation.scenario_pass { "pass" } else { "fail" }
            ),
        ),
    ];
    if !evaluation.scenario_pass {
        steps.push((
            "Plan mitigation".to_string(),
            format!("{} action(s) planned", input.mitigation_plan.actions.len()),
        ));
    }
    steps.push((
        "Build evidence record".to_string(),
        format!("Execution {} sealed", input.execution_context.execution_id),
    ));

    steps
        .into_iter()
        .enumerate()
        .map(|(i, (action, result_summary))| TestStep {
            step_id: i as u32 + 1,
            action,
            status: "completed".to_string(),
            timestamp: at,
            result_summary,
        })
        .collect()
}

fn success_section(
    input: EvidenceInput<'_>,
    metrics: &BTreeMap<String, f64>,
) -> SuccessEvidence {
    SuccessEvidence {
        summary: "Test passed with no required criterion failing".to_string(),
        criteria_passed: input
            .evaluation
            .results
            .iter()
            .filter(|r| r.passed)
            .map(|r| r.criterion_id.clone())
            .collect(),
        metrics_within_bounds: metrics.keys().cloned().collect(),
    }
}

fn failure_section(input: EvidenceInput<'_>) -> FailureEvidence {
    FailureEvidence {
        summary: format!(
            "Test failed with {} violation(s) detected",
            input.trace.violation_codes.len()
        ),
        detected_violations: input.trace.violation_codes.clone(),
        article_violations: input.trace.article_violations.clone(),
        failed_criteria: input
            .evaluation
            .results
            .iter()
            .filter(|r| r.severity == Severity::Required && !r.passed)
            .map(|r| r.criterion_id.clone())
            .collect(),
    }
}

fn mitigation_section(plan: &MitigationPlan) -> MitigationSection {
    MitigationSection {
        mitigation_required: true,
        status: if plan.is_empty() { "unplanned" } else { "open" }.to_string(),
        template_id: plan.template_id.clone(),
        plan: plan.summary.clone(),
        actions: plan.actions.clone(),
    }
}
