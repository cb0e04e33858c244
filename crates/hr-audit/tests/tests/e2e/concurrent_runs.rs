//! E2E: concurrent runs against shared scenario logs never fork a chain.

use hr_audit_evidence::GENESIS_HASH;
use hr_audit_ledger::{EvidenceLedger, FileEvidenceLog};
use hr_audit_runtime::AuditPipeline;
use hr_audit_tests::*;
use hr_audit_types::ScenarioId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const RUNS_PER_SCENARIO: usize = 12;

async fn file_pipeline(dir: &std::path::Path) -> AuditPipeline {
    let log = FileEvidenceLog::open(dir).await.unwrap();
    let ledger = EvidenceLedger::new(Arc::new(log), Duration::from_secs(5));
    AuditPipeline::new(standard_catalog(), ledger)
}

async fn run_concurrently(pipeline: &AuditPipeline, scenarios: &[&str]) {
    let mut handles = Vec::new();
    for scenario in scenarios {
        for i in 0..RUNS_PER_SCENARIO {
            let pipeline = pipeline.clone();
            let id = ScenarioId::new(*scenario);
            let candidate = if i % 3 == 0 {
                unmatched_candidate()
            } else {
                ad_targeted_female_candidate()
            };
            handles.push(tokio::spawn(async move { pipeline.run(&id, &candidate).await }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_scenario_runs_form_one_chain() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = file_pipeline(dir.path()).await;
    run_concurrently(&pipeline, &["SC06"]).await;

    let id = ScenarioId::new("SC06");
    let report = pipeline.ledger().verify(&id).await.unwrap();
    assert_eq!(report.verified_records, RUNS_PER_SCENARIO);

    let records = pipeline.ledger().records(&id).await.unwrap();
    let parents: HashSet<&str> = records.iter().map(|r| r.parent_hash()).collect();
    assert_eq!(parents.len(), RUNS_PER_SCENARIO, "two runs shared a parent hash");
    assert_eq!(records[0].parent_hash(), GENESIS_HASH);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_logs_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = file_pipeline(dir.path()).await;
    run_concurrently(&pipeline, &["SC01", "SC06", "SC22"]).await;

    let scenarios = pipeline.ledger().scenarios().await.unwrap();
    assert_eq!(scenarios.len(), 3);
    for id in scenarios {
        let report = pipeline.ledger().verify(&id).await.unwrap();
        assert_eq!(report.verified_records, RUNS_PER_SCENARIO);
        let first = &pipeline.ledger().records(&id).await.unwrap()[0];
        assert_eq!(first.parent_hash(), GENESIS_HASH);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_backend_serializes_the_same_way() {
    let pipeline = memory_pipeline();
    run_concurrently(&pipeline, &["SC01"]).await;
    let report = pipeline
        .ledger()
        .verify(&ScenarioId::new("SC01"))
        .await
        .unwrap();
    assert_eq!(report.verified_records, RUNS_PER_SCENARIO);
}
