//! E2E: stalled external I/O surfaces as an execution timeout, never a hang.

use async_trait::async_trait;
use hr_audit_evidence::{EvidenceRecord, GENESIS_HASH};
use hr_audit_ledger::{EvidenceLedger, EvidenceLog, FileEvidenceLog, LedgerResult};
use hr_audit_runtime::{AuditPipeline, CandidateRepository, ExecutionConfig};
use hr_audit_tests::*;
use hr_audit_types::{AuditError, AuditResult, CandidateProfile, ExecutionFailure, ScenarioId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Log whose appends never complete.
#[derive(Default)]
struct HangingAppendLog {
    appends: AtomicUsize,
}

#[async_trait]
impl EvidenceLog for HangingAppendLog {
    async fn head_hash(&self, _: &ScenarioId) -> LedgerResult<String> {
        Ok(GENESIS_HASH.to_string())
    }

    async fn append(&self, _: &EvidenceRecord) -> LedgerResult<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn raw_lines(&self, _: &ScenarioId) -> LedgerResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn scenarios(&self) -> LedgerResult<Vec<ScenarioId>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn hanging_append_times_out_and_releases_lock() {
    let log = Arc::new(HangingAppendLog::default());
    let ledger = EvidenceLedger::new(log.clone(), Duration::from_millis(30));
    let pipeline = AuditPipeline::new(standard_catalog(), ledger);
    let id = ScenarioId::new("SC06");

    for _ in 0..2 {
        let err = pipeline
            .run(&id, &ad_targeted_female_candidate())
            .await
            .unwrap_err();
        match err {
            AuditError::Execution(ExecutionFailure::Timeout { operation, .. }) => {
                assert_eq!(operation, "evidence append");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
    assert_eq!(log.appends.load(Ordering::SeqCst), 2);
}

struct StalledRepository;

#[async_trait]
impl CandidateRepository for StalledRepository {
    async fn fetch(&self, _: &str) -> AuditResult<CandidateProfile> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(unmatched_candidate())
    }
}

#[tokio::test]
async fn stalled_profile_retrieval_times_out() {
    let pipeline = memory_pipeline().with_execution(ExecutionConfig {
        profile_timeout_ms: 25,
        ..ExecutionConfig::default()
    });
    let id = ScenarioId::new("SC06");
    let err = pipeline
        .run_candidate(&id, &StalledRepository, "CAND-001")
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(pipeline.ledger().records(&id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_runs_on_a_slow_file_log_persist_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(FileEvidenceLog::open(dir.path()).await.unwrap());
    let ledger = EvidenceLedger::new(log.clone(), Duration::from_micros(300))
        .with_lock_timeout(Duration::from_secs(30));
    let pipeline = AuditPipeline::new(standard_catalog(), ledger);
    let id = ScenarioId::new("SC06");

    let mut persisted = 0;
    for run in 0..60 {
        match pipeline
            .run_in_context(
                &id,
                &ad_targeted_female_candidate(),
                fixed_context(run),
                &mut StdRng::seed_from_u64(u64::from(run)),
            )
            .await
        {
            Ok(_) => persisted += 1,
            Err(e) => assert!(e.is_timeout(), "run {run}: {e}"),
        }
        assert_eq!(log.raw_lines(&id).await.unwrap().len(), persisted);
    }
}
