//! E2E: a file-backed log survives restarts, digests and configuration loading.

use hr_audit_ledger::{merkle_root, EvidenceLog, FileEvidenceLog};
use hr_audit_runtime::{AuditConfig, AuditPipeline, EvidenceBackend, InMemoryCandidateRepository};
use hr_audit_tests::*;
use hr_audit_types::ScenarioId;

fn file_config(dir: &std::path::Path) -> AuditConfig {
    let mut config = AuditConfig::default();
    config.evidence.backend = EvidenceBackend::File;
    config.evidence.log_dir = dir.to_path_buf();
    config.execution.executed_by = "e2e".into();
    config
}

#[tokio::test]
async fn chain_continues_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let id = ScenarioId::new("SC01");

    let first = {
        let pipeline = AuditPipeline::from_config(&file_config(dir.path())).await.unwrap();
        pipeline.run(&id, &ad_targeted_female_candidate()).await.unwrap()
    };

    let pipeline = AuditPipeline::from_config(&file_config(dir.path())).await.unwrap();
    let second = pipeline.run(&id, &unmatched_candidate()).await.unwrap();
    assert_eq!(second.record.parent_hash(), first.record_hash());
    assert_eq!(second.record.execution_context.executed_by, "e2e");

    let report = pipeline.ledger().verify(&id).await.unwrap();
    assert_eq!(report.verified_records, 2);
    assert_eq!(report.head_hash, second.record_hash());
}

#[tokio::test]
async fn digest_matches_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AuditPipeline::from_config(&file_config(dir.path())).await.unwrap();
    let id = ScenarioId::new("SC06");
    for _ in 0..3 {
        pipeline.run(&id, &ad_targeted_female_candidate()).await.unwrap();
    }

    let digest = pipeline.ledger().digest(&id).await.unwrap();
    assert_eq!(digest.run_count, 3);

    let log = FileEvidenceLog::open(dir.path()).await.unwrap();
    let lines = log.raw_lines(&id).await.unwrap();
    assert_eq!(digest.merkle_root, merkle_root(&lines));

    let meta = log.write_meta(&digest).await.unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(meta).unwrap()).unwrap();
    assert_eq!(written["run_count"], 3);
    assert_eq!(written["merkle_root"], digest.merkle_root.as_str());
}

#[tokio::test]
async fn failed_run_leaves_log_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AuditPipeline::from_config(&file_config(dir.path())).await.unwrap();
    let id = ScenarioId::new("SC06");
    pipeline.run(&id, &unmatched_candidate()).await.unwrap();
    let before = pipeline.ledger().digest(&id).await.unwrap();

    let err = pipeline
        .run(&id, &profile(serde_json::json!({"name": "Emily Watson"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert_eq!(pipeline.ledger().digest(&id).await.unwrap(), before);
}

#[tokio::test]
async fn demo_config_and_candidates_run() {
    let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../demos");
    let mut config = AuditConfig::load(demos.join("hr-audit.toml").to_str()).unwrap();
    assert_eq!(config.execution.executed_by, "compliance-ci");

    let dir = tempfile::tempdir().unwrap();
    config.evidence.log_dir = dir.path().to_path_buf();
    let pipeline = AuditPipeline::from_config(&config).await.unwrap();
    let candidates = InMemoryCandidateRepository::from_json_file(&demos.join("candidates.json"))
        .await
        .unwrap();

    for (scenario, candidate, passes) in [
        ("SC01", "CAND-001", false),
        ("SC10", "CAND-003", false),
        ("SC21", "CAND-003", false),
        ("SC13", "CAND-004", false),
        ("SC02", "CAND-004", true),
    ] {
        let report = pipeline
            .run_candidate(&ScenarioId::new(scenario), &candidates, candidate)
            .await
            .unwrap();
        assert_eq!(report.passed(), passes, "{} / {}", scenario, candidate);
        assert_eq!(report.record.execution_context.execution_environment, "staging");
    }
}
