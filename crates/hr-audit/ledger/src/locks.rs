use dashmap::DashMap;
use hr_audit_types::ScenarioId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-scenario append locks.
///
/// The returned guard is owned, so it is released on every exit path of the
/// holder, including errors, timeouts and cancellation.
#[derive(Clone, Default)]
pub struct ScenarioLocks {
    locks: Arc<DashMap<ScenarioId, Arc<Mutex<()>>>>,
}

impl ScenarioLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, scenario_id: &ScenarioId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(scenario_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of scenarios that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
