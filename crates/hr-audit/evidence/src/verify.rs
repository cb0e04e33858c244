//! Verification of records and provenance chains.
//!
//! Any mismatch is reported as an error naming the first bad record. There is
//! no "partially valid" outcome: a broken chain is untrusted from that point on.

use crate::canonical::record_hash;
use crate::error::EvidenceError;
use crate::record::{EvidenceRecord, GENESIS_HASH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Outcome of a successful chain verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub total_records: usize,
    pub verified_records: usize,
    /// Hash of the last record, or the genesis hash for an empty chain.
    pub head_hash: String,
}

/// Recompute one record's hash from its own sections and stored parent hash.
pub fn verify_record(record: &EvidenceRecord) -> Result<(), EvidenceError> {
    check_hash(0, record.record_hash(), record.compute_hash()?)
}

/// Verify hashes and links of a full scenario log, starting from genesis.
pub fn verify_chain(records: &[EvidenceRecord]) -> Result<ChainVerification, EvidenceError> {
    let mut expected_parent = GENESIS_HASH.to_string();
    for (index, record) in records.iter().enumerate() {
        check_link(index, &expected_parent, record.parent_hash())?;
        check_hash(index, record.record_hash(), record.compute_hash()?)?;
        expected_parent = record.record_hash().to_string();
    }
    Ok(ChainVerification {
        total_records: records.len(),
        verified_records: records.len(),
        head_hash: expected_parent,
    })
}

/// Verify a log from its raw JSON lines without the typed model.
///
/// Fields unknown to this version of the schema are still hashed, so records
/// written by a newer writer verify as long as they are intact. Blank lines
/// are skipped.
pub fn verify_raw_lines<'a, I>(lines: I) -> Result<ChainVerification, EvidenceError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut expected_parent = GENESIS_HASH.to_string();
    let mut total = 0;
    for line in lines.into_iter().filter(|l| !l.trim().is_empty()) {
        let index = total;
        total += 1;

        let mut value: Value = serde_json::from_str(line).map_err(|e| EvidenceError::Malformed {
            index,
            message: e.to_string(),
        })?;
        let object = value.as_object_mut().ok_or_else(|| EvidenceError::Malformed {
            index,
            message: "record is not a JSON object".to_string(),
        })?;
        let provenance = object.remove("provenance").ok_or_else(|| EvidenceError::Malformed {
            index,
            message: "missing provenance".to_string(),
        })?;
        let parent = string_field(&provenance, "parent_hash", index)?;
        let stored = string_field(&provenance, "record_hash", index)?;

        check_link(index, &expected_parent, &parent)?;
        check_hash(index, &stored, record_hash(&value, &parent)?)?;
        expected_parent = stored;
    }
    Ok(ChainVerification {
        total_records: total,
        verified_records: total,
        head_hash: expected_parent,
    })
}

fn string_field(provenance: &Value, key: &str, index: usize) -> Result<String, EvidenceError> {
    provenance
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EvidenceError::Malformed {
            index,
            message: format!("provenance.{} missing or not a string", key),
        })
}

fn check_link(index: usize, expected: &str, found: &str) -> Result<(), EvidenceError> {
    if expected == found {
        return Ok(());
    }
    warn!(index, expected, found, "Evidence chain link broken");
    Err(EvidenceError::BrokenLink {
        index,
        expected: expected.to_string(),
        found: found.to_string(),
    })
}

fn check_hash(index: usize, stored: &str, computed: String) -> Result<(), EvidenceError> {
    if stored == computed {
        return Ok(());
    }
    warn!(index, stored, computed = %computed, "Evidence record hash mismatch");
    Err(EvidenceError::RecordTampered {
        index,
        stored: stored.to_string(),
        computed,
    })
}
