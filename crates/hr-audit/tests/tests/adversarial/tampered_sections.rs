//! Adversarial: edits to any hashed section are detected on verification.

use hr_audit_evidence::{
    verify_chain, verify_raw_lines, verify_record, EvidenceError, SuccessEvidence, Verdict,
};
use hr_audit_tests::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lines_of(chain: &[hr_audit_evidence::EvidenceRecord]) -> Vec<String> {
    chain.iter().map(|r| r.to_json_line().unwrap()).collect()
}

fn assert_tampered_at(result: Result<impl std::fmt::Debug, EvidenceError>, at: usize) {
    match result {
        Err(EvidenceError::RecordTampered { index, .. }) => assert_eq!(index, at),
        other => panic!("expected tampering at {at}, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn intact_chain_verifies() {
    let chain = build_chain("SC01", 5);
    let report = verify_chain(&chain).unwrap();
    assert_eq!(report.verified_records, 5);
    assert_eq!(report.head_hash, chain[4].record_hash());
    assert_eq!(verify_raw_lines(lines_of(&chain).iter().map(String::as_str)).unwrap(), report);
}

#[test]
fn inflated_score_detected() {
    let mut chain = build_chain("SC01", 3);
    chain[1].actual_results.scoring_trace.final_score = 100.0;
    assert_tampered_at(verify_chain(&chain), 1);
}

#[test]
fn sub_micro_score_edit_detected_in_raw_lines() {
    let chain = build_chain("SC01", 2);
    let original = lines_of(&chain);
    let stored = chain[0].actual_results.scoring_trace.final_score;

    for edited_score in [stored + 4e-7, f64::from_bits(stored.to_bits() + 1)] {
        let mut value: Value = serde_json::from_str(&original[0]).unwrap();
        value["actual_results"]["scoring_trace"]["final_score"] = serde_json::json!(edited_score);
        let mut lines = original.clone();
        lines[0] = serde_json::to_string(&value).unwrap();
        assert_ne!(lines[0], original[0]);
        assert_tampered_at(verify_raw_lines(lines.iter().map(String::as_str)), 0);
    }
}

#[test]
fn flipped_verdict_detected() {
    let mut chain = build_chain("SC01", 3);
    let record = &mut chain[0];
    assert_eq!(record.evaluation.overall_result, Verdict::Fail);

    record.evaluation.overall_result = Verdict::Pass;
    record.failure_evidence = None;
    record.mitigation = None;
    record.success_evidence = Some(SuccessEvidence {
        summary: "Test passed".into(),
        criteria_passed: vec![],
        metrics_within_bounds: vec![],
    });
    assert!(verify_record(record).is_err());
    assert_tampered_at(verify_chain(&chain), 0);
}

#[test]
fn removed_violation_code_detected() {
    let mut chain = build_chain("SC06", 2);
    let trace = &mut chain[0].actual_results.scoring_trace;
    trace.violation_codes.clear();
    trace.article_violations.clear();
    assert_tampered_at(verify_chain(&chain), 0);
}

#[test]
fn edited_execution_identity_detected() {
    let mut chain = build_chain("SC06", 2);
    chain[1].execution_context.executed_by = "someone-else".into();
    assert_tampered_at(verify_chain(&chain), 1);
}

#[test]
fn injected_unknown_field_detected_in_raw_lines() {
    let chain = build_chain("SC06", 2);
    let mut lines = lines_of(&chain);
    let mut value: Value = serde_json::from_str(&lines[0]).unwrap();
    value["reviewer_note"] = Value::String("approved".into());
    lines[0] = serde_json::to_string(&value).unwrap();

    assert_tampered_at(verify_raw_lines(lines.iter().map(String::as_str)), 0);
}

#[test]
fn key_order_and_whitespace_do_not_matter() {
    let chain = build_chain("SC06", 2);
    let lines: Vec<String> = lines_of(&chain)
        .iter()
        .map(|line| {
            let value: Value = serde_json::from_str(line).unwrap();
            serde_json::to_string_pretty(&value).unwrap().replace('\n', " ")
        })
        .collect();
    assert_eq!(
        verify_raw_lines(lines.iter().map(String::as_str))
            .unwrap()
            .verified_records,
        2
    );
}

#[test]
fn resealing_one_record_breaks_the_next_link() {
    let mut chain = build_chain("SC01", 3);
    chain[1].actual_results.scoring_trace.final_score = 100.0;
    chain[1].provenance.record_hash = chain[1].compute_hash().unwrap();
    verify_record(&chain[1]).unwrap();

    match verify_chain(&chain) {
        Err(EvidenceError::BrokenLink { index, .. }) => assert_eq!(index, 2),
        other => panic!("expected broken link, got {other:?}"),
    }
}
