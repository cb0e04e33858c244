//! Adversarial: forged, reordered, dropped and spliced records break the chain.

use hr_audit_evidence::{verify_chain, EvidenceError, EvidenceRecord, GENESIS_HASH};
use hr_audit_ledger::{EvidenceLog, LedgerError, LogDigest, MemoryEvidenceLog};
use hr_audit_tests::*;
use hr_audit_types::{AuditError, ScenarioId};

fn broken_link_at(chain: &[EvidenceRecord]) -> usize {
    match verify_chain(chain) {
        Err(EvidenceError::BrokenLink { index, .. }) => index,
        other => panic!("expected a broken link, got {other:?}"),
    }
}

#[test]
fn forged_genesis_parent_rejected() {
    let mut chain = build_chain("SC06", 2);
    chain[0].provenance.parent_hash = "ab".repeat(32);
    chain[0].provenance.record_hash = chain[0].compute_hash().unwrap();
    assert_eq!(broken_link_at(&chain), 0);
}

#[test]
fn dropped_record_detected() {
    let mut chain = build_chain("SC06", 4);
    chain.remove(2);
    assert_eq!(broken_link_at(&chain), 2);
}

#[test]
fn reordered_records_detected() {
    let mut chain = build_chain("SC06", 4);
    chain.swap(1, 2);
    assert_eq!(broken_link_at(&chain), 1);
}

#[test]
fn record_spliced_from_another_scenario_detected() {
    let mut chain = build_chain("SC06", 3);
    let foreign = build_chain("SC01", 3);
    chain[1] = foreign[1].clone();
    assert_eq!(broken_link_at(&chain), 1);
}

#[test]
fn builder_refuses_malformed_parent() {
    let catalog = standard_catalog();
    let uppercase = "AB".repeat(32);
    for parent in ["not-a-hash", "", uppercase.as_str()] {
        let err = try_build_record(
            &catalog,
            &ScenarioId::new("SC06"),
            &unmatched_candidate(),
            &fixed_context(0),
            parent,
        )
        .unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidParentHash(_)));
    }
}

#[tokio::test]
async fn log_rejects_stale_parent() {
    let log = MemoryEvidenceLog::new();
    let chain = build_chain("SC06", 2);
    log.append(&chain[0]).await.unwrap();

    let mut stale = chain[1].clone();
    stale.provenance.parent_hash = GENESIS_HASH.to_string();
    stale.provenance.record_hash = stale.compute_hash().unwrap();

    let err = log.append(&stale).await.unwrap_err();
    assert!(matches!(err, LedgerError::ChainConflict { .. }));
    assert!(matches!(AuditError::from(err), AuditError::Integrity(_)));
    assert_eq!(log.raw_lines(&ScenarioId::new("SC06")).await.unwrap().len(), 1);
}

#[test]
fn fully_resealed_history_changes_the_digest() {
    let chain = build_chain("SC06", 3);
    let lines: Vec<String> = chain.iter().map(|r| r.to_json_line().unwrap()).collect();
    let anchored = LogDigest::from_lines(ScenarioId::new("SC06"), &lines);

    // Rewrite record 0 and reseal everything after it.
    let mut forged = chain.clone();
    forged[0].execution_context.executed_by = "mallory".into();
    let mut parent = GENESIS_HASH.to_string();
    for record in forged.iter_mut() {
        record.provenance.parent_hash = parent.clone();
        record.provenance.record_hash = record.compute_hash().unwrap();
        parent = record.record_hash().to_string();
    }
    verify_chain(&forged).unwrap();

    let forged_lines: Vec<String> = forged.iter().map(|r| r.to_json_line().unwrap()).collect();
    let digest = LogDigest::from_lines(ScenarioId::new("SC06"), &forged_lines);
    assert_eq!(digest.run_count, anchored.run_count);
    assert_ne!(digest.merkle_root, anchored.merkle_root);
    assert_ne!(digest.sha256, anchored.sha256);
}
