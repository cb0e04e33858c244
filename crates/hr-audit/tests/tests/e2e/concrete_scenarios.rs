//! E2E: the two reference candidates, from scoring through a persisted record.

use hr_audit_evidence::{verify_record, Verdict, GENESIS_HASH};
use hr_audit_scoring::ScoringEngine;
use hr_audit_tests::*;
use hr_audit_types::{CriterionId, ScenarioId};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[test]
fn ad_targeted_female_candidate_scores_46() {
    let engine = ScoringEngine::new(standard_catalog());
    let trace = engine
        .score(&ScenarioId::new("SC01"), &ad_targeted_female_candidate())
        .unwrap();

    assert_eq!(trace.base_score, 100.0);
    assert!((trace.final_score - 46.0).abs() < 1e-9);
    assert_eq!(
        trace.violation_codes,
        vec!["GENDER_BIAS_SC06", "AD_TARGETING_GENDER_SC01"]
    );
    assert_eq!(trace.adjustments.len(), 2);
    assert!((trace.adjustments[0].delta - -8.0).abs() < 1e-9);
    assert!((trace.adjustments[1].delta - -50.0).abs() < 1e-9);
    assert!(!trace.nondeterministic);
}

#[test]
fn unmatched_candidate_keeps_base_score() {
    let engine = ScoringEngine::new(standard_catalog());
    let trace = engine
        .score(&ScenarioId::new("SC06"), &unmatched_candidate())
        .unwrap();

    assert_eq!(trace.base_score, 50.0);
    assert_eq!(trace.final_score, 50.0);
    assert!(trace.adjustments.is_empty());
    assert!(trace.violation_codes.is_empty());
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_run_produces_failure_evidence_and_plan() {
    let pipeline = memory_pipeline();
    let id = ScenarioId::new("SC01");
    let report = pipeline
        .run_in_context(
            &id,
            &ad_targeted_female_candidate(),
            fixed_context(1),
            &mut StdRng::seed_from_u64(11),
        )
        .await
        .unwrap();

    let record = &report.record;
    assert_eq!(record.evaluation.overall_result, Verdict::Fail);
    assert!(record.success_evidence.is_none());

    let failure = record.failure_evidence.as_ref().unwrap();
    assert_eq!(
        failure.detected_violations,
        vec!["GENDER_BIAS_SC06", "AD_TARGETING_GENDER_SC01"]
    );
    assert!(failure
        .failed_criteria
        .contains(&CriterionId::new("CRIT_NO_VIOLATIONS")));

    let mitigation = record.mitigation.as_ref().unwrap();
    assert!(mitigation.mitigation_required);
    assert_eq!(mitigation.template_id.as_deref(), Some("MIT-SC01-GENDER-COMBINED"));
    let first = &mitigation.actions[0];
    assert_eq!(first.action_id, "MIT-SC01-GENDER-COMBINED-A01");
    assert_eq!(first.deadline, epoch() + chrono::Duration::seconds(1) + chrono::Duration::days(7));
    assert!(mitigation.actions.iter().all(|a| !a.action.contains('{')));

    assert_eq!(record.parent_hash(), GENESIS_HASH);
    verify_record(record).unwrap();
}

#[tokio::test]
async fn passing_run_produces_success_evidence_only() {
    let pipeline = memory_pipeline();
    let report = pipeline
        .run_in_context(
            &ScenarioId::new("SC06"),
            &unmatched_candidate(),
            fixed_context(2),
            &mut StdRng::seed_from_u64(12),
        )
        .await
        .unwrap();

    let record = &report.record;
    assert_eq!(record.evaluation.overall_result, Verdict::Pass);
    assert!(record.failure_evidence.is_none());
    assert!(record.mitigation.is_none());
    let success = record.success_evidence.as_ref().unwrap();
    assert!(success
        .criteria_passed
        .contains(&CriterionId::new("CRIT_NO_VIOLATIONS")));
}

#[tokio::test]
async fn record_has_thirteen_fixed_sections() {
    let pipeline = memory_pipeline();
    let report = pipeline
        .run(&ScenarioId::new("SC01"), &ad_targeted_female_candidate())
        .await
        .unwrap();

    let line = report.record.to_json_line().unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    for key in [
        "schema_version",
        "scenario",
        "test_case",
        "execution_context",
        "system_under_test",
        "configuration_stack",
        "test_steps_executed",
        "actual_results",
        "evaluation",
        "success_evidence",
        "failure_evidence",
        "mitigation",
        "provenance",
    ] {
        assert!(keys.contains(&key), "missing section {}", key);
    }
    assert_eq!(keys.len(), 13);
    assert_eq!(value["schema_version"], "annexIII4_evidence_v1.0");
    assert_eq!(value["provenance"]["algorithm"], "SHA-256");
    assert!(value["success_evidence"].is_null());
}

#[tokio::test]
async fn flag_rule_fails_required_leakage_criterion() {
    let pipeline = memory_pipeline();
    let report = pipeline
        .run(
            &ScenarioId::new("SC13"),
            &profile(serde_json::json!({
                "name": "Jordan Blake",
                "skills": ["Python", "AWS"],
                "reasoning_chain": ["Candidate background suggests family plans"]
            })),
        )
        .await
        .unwrap();

    let trace = &report.record.actual_results.scoring_trace;
    assert_eq!(trace.final_score, trace.base_score);
    assert!(!report.passed());
    let failure = report.record.failure_evidence.as_ref().unwrap();
    assert_eq!(failure.article_violations, vec!["Art. 9", "Art. 13"]);
}
