use crate::error::LedgerResult;
use async_trait::async_trait;
use hr_audit_evidence::EvidenceRecord;
use hr_audit_types::ScenarioId;
use std::time::Duration;

/// Append-only store of evidence records, one log per scenario.
///
/// Implementations never rewrite or delete a persisted line. An append either
/// lands whole or not at all.
#[async_trait]
pub trait EvidenceLog: Send + Sync {
    /// Hash of the last record in the log, or the genesis hash when empty.
    async fn head_hash(&self, scenario_id: &ScenarioId) -> LedgerResult<String>;

    /// Append a sealed record. Rejected with `ChainConflict` unless its parent
    /// hash equals the current head.
    async fn append(&self, record: &EvidenceRecord) -> LedgerResult<()>;

    /// Append, giving up with `Timeout` once `timeout` has elapsed.
    ///
    /// `Ok` means the line is in the log and any `Err` means it is not. The
    /// default drops [`append`](Self::append) on expiry, which holds only for
    /// logs that do nothing observable before their append completes. Logs
    /// that hand the write to another thread override this.
    async fn append_within(&self, record: &EvidenceRecord, timeout: Duration) -> LedgerResult<()> {
        match tokio::time::timeout(timeout, self.append(record)).await {
            Ok(result) => result,
            Err(_) => Err(crate::LedgerError::Timeout {
                operation: "evidence append",
                timeout,
            }),
        }
    }

    /// Raw JSON lines of the log, oldest first.
    async fn raw_lines(&self, scenario_id: &ScenarioId) -> LedgerResult<Vec<String>>;

    /// Scenarios that have a log.
    async fn scenarios(&self) -> LedgerResult<Vec<ScenarioId>>;

    /// Typed records of the log, oldest first.
    async fn records(&self, scenario_id: &ScenarioId) -> LedgerResult<Vec<EvidenceRecord>> {
        self.raw_lines(scenario_id)
            .await?
            .iter()
            .enumerate()
            .map(|(i, line)| {
                EvidenceRecord::from_json_line(line).map_err(|e| crate::LedgerError::Corrupt {
                    scenario_id: scenario_id.to_string(),
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

/// Head hash stored in the provenance of a raw line.
pub(crate) fn head_of_line(
    scenario_id: &ScenarioId,
    line_number: usize,
    line: &str,
) -> LedgerResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| crate::LedgerError::Corrupt {
            scenario_id: scenario_id.to_string(),
            line: line_number,
            message: e.to_string(),
        })?;
    value
        .get("provenance")
        .and_then(|p| p.get("record_hash"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| crate::LedgerError::Corrupt {
            scenario_id: scenario_id.to_string(),
            line: line_number,
            message: "missing provenance.record_hash".to_string(),
        })
}
