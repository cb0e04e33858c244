//! Whole-log digests: a SHA-256 of the log bytes and a Merkle root over its lines.

use hr_audit_types::ScenarioId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Integrity summary of one scenario log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDigest {
    pub scenario_id: ScenarioId,
    /// SHA-256 of the log as stored: every line followed by `\n`.
    pub sha256: String,
    pub merkle_root: String,
    pub run_count: usize,
}

impl LogDigest {
    pub fn from_lines(scenario_id: ScenarioId, lines: &[String]) -> Self {
        let mut hasher = Sha256::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Self {
            scenario_id,
            sha256: hex::encode(hasher.finalize()),
            merkle_root: merkle_root(lines),
            run_count: lines.len(),
        }
    }
}

/// Leaves are SHA-256 of each line; parents hash the concatenated child
/// digests; an odd node is paired with itself. The empty root is SHA-256("").
pub fn merkle_root(lines: &[String]) -> String {
    let mut level: Vec<Vec<u8>> = lines
        .iter()
        .map(|line| Sha256::digest(line.as_bytes()).to_vec())
        .collect();

    if level.is_empty() {
        return hex::encode(Sha256::digest(b""));
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut hasher = Sha256::new();
                hasher.update(left);
                hasher.update(right);
                hasher.finalize().to_vec()
            })
            .collect();
    }

    hex::encode(&level[0])
}
