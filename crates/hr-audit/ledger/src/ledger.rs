use crate::digest::LogDigest;
use crate::error::LedgerError;
use crate::locks::ScenarioLocks;
use crate::traits::EvidenceLog;
use hr_audit_evidence::{verify_raw_lines, ChainVerification, EvidenceRecord};
use hr_audit_types::{AuditError, AuditResult, ScenarioId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Serialized, timeout-bounded access to an [`EvidenceLog`].
#[derive(Clone)]
pub struct EvidenceLedger {
    log: Arc<dyn EvidenceLog>,
    locks: ScenarioLocks,
    io_timeout: Duration,
    lock_timeout: Duration,
}

impl EvidenceLedger {
    pub fn new(log: Arc<dyn EvidenceLog>, io_timeout: Duration) -> Self {
        Self {
            log,
            locks: ScenarioLocks::new(),
            io_timeout,
            lock_timeout: io_timeout * 4,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn log(&self) -> &Arc<dyn EvidenceLog> {
        &self.log
    }

    /// Read the head hash, build a record on it, and append it, all under the
    /// scenario's lock.
    ///
    /// `build` receives the parent hash. If it fails, nothing is written. The
    /// lock is released on every exit path.
    pub async fn append_with<F>(
        &self,
        scenario_id: &ScenarioId,
        build: F,
    ) -> AuditResult<EvidenceRecord>
    where
        F: FnOnce(&str) -> AuditResult<EvidenceRecord> + Send,
    {
        let _guard = tokio::time::timeout(self.lock_timeout, self.locks.acquire(scenario_id))
            .await
            .map_err(|_| {
                AuditError::timeout("evidence lock acquisition", self.lock_timeout)
            })?;

        let head = self
            .bounded("evidence head read", self.log.head_hash(scenario_id))
            .await?;

        let record = build(&head)?;
        if record.parent_hash() != head {
            return Err(AuditError::integrity(format!(
                "record for `{}` was built on {} but the log head is {}",
                scenario_id,
                record.parent_hash(),
                head
            )));
        }

        // Not wrapped in `bounded`: the log honours the timeout itself and
        // reports only what actually landed, so the guard is held until then.
        self.log
            .append_within(&record, self.io_timeout)
            .await
            .map_err(|e| {
                if let LedgerError::Timeout { operation, timeout } = &e {
                    warn!(operation = *operation, timeout = ?timeout, "Evidence I/O timed out");
                }
                AuditError::from(e)
            })?;

        info!(
            scenario_id = %scenario_id,
            execution_id = %record.execution_context.execution_id,
            record_hash = %record.record_hash(),
            stage = "persisted",
            "Evidence record appended"
        );
        Ok(record)
    }

    pub async fn head_hash(&self, scenario_id: &ScenarioId) -> AuditResult<String> {
        self.bounded("evidence head read", self.log.head_hash(scenario_id))
            .await
    }

    pub async fn records(&self, scenario_id: &ScenarioId) -> AuditResult<Vec<EvidenceRecord>> {
        self.bounded("evidence read", self.log.records(scenario_id))
            .await
    }

    pub async fn scenarios(&self) -> AuditResult<Vec<ScenarioId>> {
        self.bounded("evidence listing", self.log.scenarios()).await
    }

    /// Verify the scenario's whole chain from its raw lines.
    pub async fn verify(&self, scenario_id: &ScenarioId) -> AuditResult<ChainVerification> {
        let lines = self
            .bounded("evidence read", self.log.raw_lines(scenario_id))
            .await?;
        verify_raw_lines(lines.iter().map(String::as_str)).map_err(|e| {
            warn!(scenario_id = %scenario_id, error = %e, "Evidence chain failed verification");
            AuditError::from(e)
        })
    }

    pub async fn digest(&self, scenario_id: &ScenarioId) -> AuditResult<LogDigest> {
        let lines = self
            .bounded("evidence read", self.log.raw_lines(scenario_id))
            .await?;
        Ok(LogDigest::from_lines(scenario_id.clone(), &lines))
    }

    async fn bounded<T, Fut>(&self, operation: &'static str, fut: Fut) -> AuditResult<T>
    where
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(result) => result.map_err(AuditError::from),
            Err(_) => {
                warn!(operation, timeout = ?self.io_timeout, "Evidence I/O timed out");
                Err(LedgerError::Timeout {
                    operation,
                    timeout: self.io_timeout,
                }
                .into())
            }
        }
    }
}
