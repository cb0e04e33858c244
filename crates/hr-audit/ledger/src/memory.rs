//! In-memory evidence log for tests and one-shot runs.

use crate::error::{LedgerError, LedgerResult};
use crate::traits::EvidenceLog;
use async_trait::async_trait;
use hr_audit_evidence::{EvidenceRecord, GENESIS_HASH};
use hr_audit_types::ScenarioId;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct ScenarioLog {
    lines: Vec<String>,
    head: Option<String>,
}

/// Evidence log kept in process memory.
#[derive(Default)]
pub struct MemoryEvidenceLog {
    logs: RwLock<BTreeMap<ScenarioId, ScenarioLog>>,
}

impl MemoryEvidenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a raw line, bypassing chain checks. For tamper tests.
    #[doc(hidden)]
    pub fn push_raw_line(&self, scenario_id: &ScenarioId, line: String) -> LedgerResult<()> {
        let mut logs = self.logs.write().map_err(|_| poisoned())?;
        logs.entry(scenario_id.clone()).or_default().lines.push(line);
        Ok(())
    }

    /// Overwrite a raw line in place. For tamper tests.
    #[doc(hidden)]
    pub fn replace_raw_line(
        &self,
        scenario_id: &ScenarioId,
        index: usize,
        line: String,
    ) -> LedgerResult<()> {
        let mut logs = self.logs.write().map_err(|_| poisoned())?;
        let slot = logs
            .get_mut(scenario_id)
            .and_then(|log| log.lines.get_mut(index))
            .ok_or_else(|| LedgerError::Backend(format!("no line {} in log", index)))?;
        *slot = line;
        Ok(())
    }
}

fn poisoned() -> LedgerError {
    LedgerError::Backend("lock poisoned".into())
}

#[async_trait]
impl EvidenceLog for MemoryEvidenceLog {
    async fn head_hash(&self, scenario_id: &ScenarioId) -> LedgerResult<String> {
        let logs = self.logs.read().map_err(|_| poisoned())?;
        Ok(logs
            .get(scenario_id)
            .and_then(|log| log.head.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string()))
    }

    async fn append(&self, record: &EvidenceRecord) -> LedgerResult<()> {
        let line = record.to_json_line().map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let mut logs = self.logs.write().map_err(|_| poisoned())?;
        let log = logs.entry(record.scenario.scenario_id.clone()).or_default();
        let head = log.head.as_deref().unwrap_or(GENESIS_HASH);
        if record.parent_hash() != head {
            return Err(LedgerError::ChainConflict {
                expected: head.to_string(),
                found: record.parent_hash().to_string(),
            });
        }
        log.lines.push(line);
        log.head = Some(record.record_hash().to_string());
        Ok(())
    }

    async fn raw_lines(&self, scenario_id: &ScenarioId) -> LedgerResult<Vec<String>> {
        let logs = self.logs.read().map_err(|_| poisoned())?;
        Ok(logs
            .get(scenario_id)
            .map(|log| log.lines.clone())
            .unwrap_or_default())
    }

    async fn scenarios(&self) -> LedgerResult<Vec<ScenarioId>> {
        let logs = self.logs.read().map_err(|_| poisoned())?;
        Ok(logs.keys().cloned().collect())
    }
}
