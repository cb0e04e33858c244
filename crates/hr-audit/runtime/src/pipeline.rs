//! One audit run: score, evaluate, plan, then build and persist the evidence
//! record under the scenario's append lock.

use crate::config::{AuditConfig, EvidenceBackend, ExecutionConfig};
use crate::repository::CandidateRepository;
use hr_audit_evaluation::{CriteriaEvaluator, MitigationPlanner};
use hr_audit_evidence::{EvidenceBuilder, EvidenceInput, EvidenceRecord, ExecutionContext};
use hr_audit_ledger::{EvidenceLedger, EvidenceLog, FileEvidenceLog, MemoryEvidenceLog};
use hr_audit_scoring::ScoringEngine;
use hr_audit_types::{
    AuditError, AuditResult, CandidateProfile, MitigationPlan, ScenarioCatalog, ScenarioId,
    TestCase,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Loaded,
    Scored,
    Evaluated,
    Planned,
    EvidenceBuilt,
    Persisted,
    ValidationFailed,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Scored => "scored",
            Self::Evaluated => "evaluated",
            Self::Planned => "planned",
            Self::EvidenceBuilt => "evidence_built",
            Self::Persisted => "persisted",
            Self::ValidationFailed => "validation_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::ValidationFailed)
    }

    /// Valid transitions. Planning is skipped by passing runs; any
    /// non-terminal stage may fail.
    pub fn can_advance_to(&self, next: RunStage) -> bool {
        use RunStage::*;
        match (self, next) {
            (from, ValidationFailed) => !from.is_terminal(),
            (Loaded, Scored)
            | (Scored, Evaluated)
            | (Evaluated, Planned)
            | (Evaluated, EvidenceBuilt)
            | (Planned, EvidenceBuilt)
            | (EvidenceBuilt, Persisted) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a persisted run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario_id: ScenarioId,
    pub execution_id: String,
    pub stages: Vec<RunStage>,
    pub record: EvidenceRecord,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.record.passed()
    }

    pub fn record_hash(&self) -> &str {
        self.record.record_hash()
    }
}

struct StageTracker {
    stages: Vec<RunStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self { stages: Vec::new() }
    }

    fn current(&self) -> Option<RunStage> {
        self.stages.last().copied()
    }

    fn advance(&mut self, next: RunStage) {
        if let Some(current) = self.current() {
            if !current.can_advance_to(next) {
                warn!(from = %current, to = %next, "Unexpected run stage transition");
            }
        }
        self.stages.push(next);
        info!(stage = %next, "Run stage reached");
    }

    fn fail(&mut self, error: &AuditError) {
        let failed_after = self.current().map(|s| s.as_str()).unwrap_or("start");
        self.stages.push(RunStage::ValidationFailed);
        warn!(
            stage = %RunStage::ValidationFailed,
            failed_after,
            error_kind = error.kind(),
            error = %error,
            "Audit run aborted"
        );
    }
}

/// The scoring, evaluation and evidence pipeline for one catalog.
#[derive(Clone)]
pub struct AuditPipeline {
    catalog: Arc<ScenarioCatalog>,
    engine: ScoringEngine,
    evaluator: CriteriaEvaluator,
    planner: MitigationPlanner,
    builder: EvidenceBuilder,
    ledger: EvidenceLedger,
    execution: ExecutionConfig,
}

impl AuditPipeline {
    pub fn new(catalog: Arc<ScenarioCatalog>, ledger: EvidenceLedger) -> Self {
        Self {
            engine: ScoringEngine::new(catalog.clone()),
            evaluator: CriteriaEvaluator::new(catalog.clone()),
            planner: MitigationPlanner::new(catalog.clone()),
            catalog,
            builder: EvidenceBuilder::new(),
            ledger,
            execution: ExecutionConfig::default(),
        }
    }

    pub fn with_builder(mut self, builder: EvidenceBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Build a pipeline from configuration: catalog file (or the standard
    /// catalog), evidence backend and evidence metadata.
    pub async fn from_config(config: &AuditConfig) -> AuditResult<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => crate::catalog::load_catalog(path)?,
            None => ScenarioCatalog::standard(),
        };

        let log: Arc<dyn EvidenceLog> = match config.evidence.backend {
            EvidenceBackend::Memory => Arc::new(MemoryEvidenceLog::new()),
            EvidenceBackend::File => Arc::new(FileEvidenceLog::open(&config.evidence.log_dir).await?),
        };
        let ledger = EvidenceLedger::new(log, config.evidence.io_timeout())
            .with_lock_timeout(config.evidence.lock_timeout());

        info!(
            backend = ?config.evidence.backend,
            log_dir = %config.evidence.log_dir.display(),
            scenarios = catalog.scenarios.len(),
            "Audit pipeline ready"
        );

        Ok(Self::new(Arc::new(catalog), ledger)
            .with_builder(
                EvidenceBuilder::new()
                    .with_system_under_test(config.system_under_test.clone())
                    .with_configuration_stack(config.configuration_stack.clone()),
            )
            .with_execution(config.execution.clone()))
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &EvidenceLedger {
        &self.ledger
    }

    /// Run a scenario against a profile, stamped now.
    pub async fn run(
        &self,
        scenario_id: &ScenarioId,
        profile: &CandidateProfile,
    ) -> AuditResult<RunReport> {
        let mut rng = StdRng::from_entropy();
        self.run_in_context(scenario_id, profile, self.execution.context(), &mut rng)
            .await
    }

    /// Fetch the profile from `repository`, bounded by the profile timeout, then run.
    pub async fn run_candidate(
        &self,
        scenario_id: &ScenarioId,
        repository: &dyn CandidateRepository,
        candidate_id: &str,
    ) -> AuditResult<RunReport> {
        let timeout = self.execution.profile_timeout();
        let profile = tokio::time::timeout(timeout, repository.fetch(candidate_id))
            .await
            .map_err(|_| {
                warn!(scenario_id = %scenario_id, candidate_id, "Profile retrieval timed out");
                AuditError::timeout("candidate profile retrieval", timeout)
            })??;
        self.run(scenario_id, &profile).await
    }

    /// Run with a caller-supplied execution context and RNG.
    ///
    /// On any error nothing is appended and the scenario lock is released.
    pub async fn run_in_context<R: Rng + Send>(
        &self,
        scenario_id: &ScenarioId,
        profile: &CandidateProfile,
        context: ExecutionContext,
        rng: &mut R,
    ) -> AuditResult<RunReport> {
        let span = info_span!(
            "audit_run",
            scenario_id = %scenario_id,
            execution_id = %context.execution_id
        );

        async move {
            let mut stages = StageTracker::new();
            match self
                .execute(scenario_id, profile, &context, rng, &mut stages)
                .await
            {
                Ok(record) => Ok(RunReport {
                    scenario_id: scenario_id.clone(),
                    execution_id: context.execution_id.clone(),
                    stages: stages.stages,
                    record,
                }),
                Err(e) => {
                    stages.fail(&e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute<R: Rng + Send>(
        &self,
        scenario_id: &ScenarioId,
        profile: &CandidateProfile,
        context: &ExecutionContext,
        rng: &mut R,
        stages: &mut StageTracker,
    ) -> AuditResult<EvidenceRecord> {
        let scenario = self.catalog.scenario(scenario_id)?;
        let test_case = scenario.test_case.clone().unwrap_or_else(|| TestCase {
            test_case_id: format!("TC-{}", scenario_id),
            title: scenario.title.clone(),
            ..TestCase::default()
        });
        stages.advance(RunStage::Loaded);

        let trace = self.engine.score_with_rng(scenario_id, profile, rng)?;
        stages.advance(RunStage::Scored);

        let evaluation = self.evaluator.evaluate(scenario_id, &trace)?;
        stages.advance(RunStage::Evaluated);

        let plan = if evaluation.scenario_pass {
            MitigationPlan::empty()
        } else {
            let plan = self
                .planner
                .plan(scenario_id, &trace.violation_codes, context.timestamp)?;
            stages.advance(RunStage::Planned);
            plan
        };

        let record = self
            .ledger
            .append_with(scenario_id, |parent| {
                let record = self.builder.build(EvidenceInput {
                    scenario,
                    test_case: &test_case,
                    execution_context: context,
                    trace: &trace,
                    evaluation: &evaluation,
                    mitigation_plan: &plan,
                    prior_hash: parent,
                })?;
                stages.advance(RunStage::EvidenceBuilt);
                Ok(record)
            })
            .await?;
        stages.advance(RunStage::Persisted);

        Ok(record)
    }
}
