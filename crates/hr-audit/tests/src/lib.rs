//! Shared fixtures and proptest strategies for the cross-crate test suites.
//!
//! - `tests/e2e_tests.rs`: full runs through the pipeline and the logs
//! - `tests/adversarial_tests.rs`: tampering, forged links, truncated logs
//! - `tests/property_tests.rs`: clamping, determinism, rule independence, chains

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use hr_audit_evaluation::{CriteriaEvaluator, MitigationPlanner};
use hr_audit_evidence::{
    EvidenceBuilder, EvidenceError, EvidenceInput, EvidenceRecord, ExecutionContext,
    GENESIS_HASH,
};
use hr_audit_ledger::{EvidenceLedger, MemoryEvidenceLog};
use hr_audit_runtime::AuditPipeline;
use hr_audit_scoring::ScoringEngine;
use hr_audit_types::{
    CandidateProfile, MitigationPlan, Scenario, ScenarioCatalog, ScenarioId, TestCase,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;


pub fn standard_catalog() -> Arc<ScenarioCatalog> {
    Arc::new(ScenarioCatalog::standard())
}

pub fn profile(value: Value) -> CandidateProfile {
    CandidateProfile::from_value(value).expect("fixture profiles are JSON objects")
}

/// Two of two required skills, a female-coded name and a male-targeted job ad.
pub fn ad_targeted_female_candidate() -> CandidateProfile {
    profile(json!({
        "candidate_id": "CAND-001",
        "name": "Emily Watson",
        "skills": ["Python", "AWS"],
        "job_ad_metadata": {"target_gender": "male"}
    }))
}

/// No matching skills and nothing any rule reacts to.
pub fn unmatched_candidate() -> CandidateProfile {
    profile(json!({
        "candidate_id": "CAND-002",
        "name": "Jordan Blake",
        "skills": ["Excel"]
    }))
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Deterministic execution context; `run` shifts the timestamp by seconds.
pub fn fixed_context(run: u32) -> ExecutionContext {
    ExecutionContext {
        execution_id: format!("EXEC-TEST-{:04}", run),
        timestamp: epoch() + ChronoDuration::seconds(i64::from(run)),
        executed_by: "hr-audit-tests".to_string(),
        execution_environment: "test".to_string(),
    }
}

pub fn memory_ledger(io_timeout: Duration) -> EvidenceLedger {
    EvidenceLedger::new(Arc::new(MemoryEvidenceLog::new()), io_timeout)
}

pub fn memory_pipeline() -> AuditPipeline {
    AuditPipeline::new(standard_catalog(), memory_ledger(Duration::from_secs(2)))
}

/// Score, evaluate, plan and build one record without touching a log.
pub fn build_record(
    catalog: &Arc<ScenarioCatalog>,
    scenario_id: &ScenarioId,
    candidate: &CandidateProfile,
    context: &ExecutionContext,
    parent: &str,
) -> EvidenceRecord {
    try_build_record(catalog, scenario_id, candidate, context, parent)
        .expect("fixture record builds")
}

/// Like [`build_record`], surfacing the builder's error.
pub fn try_build_record(
    catalog: &Arc<ScenarioCatalog>,
    scenario_id: &ScenarioId,
    candidate: &CandidateProfile,
    context: &ExecutionContext,
    parent: &str,
) -> Result<EvidenceRecord, EvidenceError> {
    let trace = ScoringEngine::new(catalog.clone())
        .score(scenario_id, candidate)
        .expect("fixture profile scores");
    let evaluation = CriteriaEvaluator::new(catalog.clone())
        .evaluate(scenario_id, &trace)
        .expect("fixture scenario evaluates");
    let plan = if evaluation.scenario_pass {
        MitigationPlan::empty()
    } else {
        MitigationPlanner::new(catalog.clone())
            .plan(scenario_id, &trace.violation_codes, context.timestamp)
            .expect("fixture violations have templates")
    };
    let scenario = catalog.scenario(scenario_id).expect("fixture scenario exists");
    let test_case = test_case_for(scenario);

    EvidenceBuilder::new()
        .build(EvidenceInput {
            scenario,
            test_case: &test_case,
            execution_context: context,
            trace: &trace,
            evaluation: &evaluation,
            mitigation_plan: &plan,
            prior_hash: parent,
        })
}

/// A valid chain of `runs` records, alternating failing and passing candidates.
pub fn build_chain(scenario_id: &str, runs: u32) -> Vec<EvidenceRecord> {
    let catalog = standard_catalog();
    let id = ScenarioId::new(scenario_id);
    let mut parent = GENESIS_HASH.to_string();
    let mut chain = Vec::new();
    for run in 0..runs {
        let candidate = if run % 2 == 0 {
            ad_targeted_female_candidate()
        } else {
            unmatched_candidate()
        };
        let record = build_record(&catalog, &id, &candidate, &fixed_context(run), &parent);
        parent = record.record_hash().to_string();
        chain.push(record);
    }
    chain
}

fn test_case_for(scenario: &Scenario) -> TestCase {
    scenario.test_case.clone().unwrap_or_else(|| TestCase {
        test_case_id: format!("TC-{}", scenario.scenario_id),
        ..TestCase::default()
    })
}

/// Names of every rule in the standard catalog that never draws randomness.
pub fn deterministic_rule_names(catalog: &ScenarioCatalog) -> Vec<String> {
    catalog
        .rules
        .iter()
        .filter(|r| !r.adjustment.is_random())
        .map(|r| r.name.clone())
        .collect()
}

/// The standard catalog plus scenario `SC-ALL` running `rule_names` in the given order.
pub fn catalog_with_all_rules(rule_names: Vec<String>) -> ScenarioCatalog {
    let mut catalog = ScenarioCatalog::standard();
    let mut scenario = catalog
        .scenario(&ScenarioId::new("SC06"))
        .expect("standard catalog has SC06")
        .clone();
    scenario.scenario_id = ScenarioId::new("SC-ALL");
    scenario.rules = rule_names;
    scenario.test_case = None;
    catalog.scenarios.push(scenario);
    catalog
}

/// Scenario ids of the standard catalog whose rules are all deterministic.
pub fn deterministic_scenarios(catalog: &ScenarioCatalog) -> Vec<ScenarioId> {
    catalog
        .scenarios
        .iter()
        .filter(|s| {
            s.rules.iter().all(|name| {
                catalog
                    .rule(name)
                    .map(|r| !r.adjustment.is_random())
                    .unwrap_or(false)
            })
        })
        .map(|s| s.scenario_id.clone())
        .collect()
}
