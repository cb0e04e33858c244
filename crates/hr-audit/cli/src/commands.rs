//! Subcommand implementations

use crate::output::{self, OutputFormat};
use anyhow::{bail, Context};
use hr_audit_ledger::FileEvidenceLog;
use hr_audit_runtime::{
    load_catalog, AuditConfig, AuditPipeline, EvidenceBackend, InMemoryCandidateRepository,
    RunReport,
};
use hr_audit_types::{CandidateProfile, ScenarioCatalog, ScenarioId};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub enum ProfileSource {
    File(PathBuf),
    Repository { file: PathBuf, id: String },
}

pub async fn run(
    config: &AuditConfig,
    scenario: &str,
    source: ProfileSource,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = AuditPipeline::from_config(config).await?;
    let scenario_id = ScenarioId::new(scenario);

    let report = match source {
        ProfileSource::File(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("cannot read profile {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("profile {} is not valid JSON", path.display()))?;
            let profile = CandidateProfile::from_value(value)?;
            pipeline.run(&scenario_id, &profile).await?
        }
        ProfileSource::Repository { file, id } => {
            let repository = InMemoryCandidateRepository::from_json_file(&file).await?;
            pipeline
                .run_candidate(&scenario_id, &repository, &id)
                .await?
        }
    };

    output::print(&report, format, render_run)
}

fn render_run(report: &RunReport) -> String {
    let trace = &report.record.actual_results.scoring_trace;
    let mut lines = vec![
        format!("scenario    {}", report.scenario_id),
        format!("execution   {}", report.execution_id),
        format!(
            "verdict     {}",
            if report.passed() { "PASS" } else { "FAIL" }
        ),
        format!(
            "score       {:.2} (base {:.2})",
            trace.final_score, trace.base_score
        ),
    ];
    if !trace.violation_codes.is_empty() {
        lines.push(format!("violations  {}", trace.violation_codes.join(", ")));
    }
    if trace.nondeterministic {
        lines.push("note        score includes a bounded-random factor".to_string());
    }
    if let Some(mitigation) = &report.record.mitigation {
        lines.push(format!(
            "mitigation  {} ({} actions, {})",
            mitigation.template_id.as_deref().unwrap_or("none"),
            mitigation.actions.len(),
            mitigation.status
        ));
    }
    lines.push(format!("record      {}", report.record_hash()));
    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct VerifyOutcome {
    scenario_id: ScenarioId,
    verified: bool,
    records: usize,
    head_hash: Option<String>,
    error: Option<String>,
}

pub async fn verify(
    config: &AuditConfig,
    scenario: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = AuditPipeline::from_config(config).await?;
    let ledger = pipeline.ledger();
    let scenarios = match scenario {
        Some(id) => vec![ScenarioId::new(id)],
        None => ledger.scenarios().await?,
    };

    let mut outcomes = Vec::with_capacity(scenarios.len());
    for scenario_id in scenarios {
        let outcome = match ledger.verify(&scenario_id).await {
            Ok(report) => VerifyOutcome {
                scenario_id,
                verified: true,
                records: report.verified_records,
                head_hash: Some(report.head_hash),
                error: None,
            },
            Err(e) => VerifyOutcome {
                scenario_id,
                verified: false,
                records: 0,
                head_hash: None,
                error: Some(e.to_string()),
            },
        };
        outcomes.push(outcome);
    }

    output::print(&outcomes, format, |outcomes| {
        if outcomes.is_empty() {
            return "no evidence logs".to_string();
        }
        outcomes
            .iter()
            .map(|o| match &o.error {
                None => format!("{:<8} ok      {} records", o.scenario_id, o.records),
                Some(e) => format!("{:<8} FAILED  {}", o.scenario_id, e),
            })
            .collect::<Vec<_>>()
            .join("\n")
    })?;

    let failed = outcomes.iter().filter(|o| !o.verified).count();
    if failed > 0 {
        bail!("{} evidence log(s) failed verification", failed);
    }
    Ok(())
}

pub async fn digest(
    config: &AuditConfig,
    scenario: &str,
    write: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pipeline = AuditPipeline::from_config(config).await?;
    let digest = pipeline.ledger().digest(&ScenarioId::new(scenario)).await?;

    if write {
        if config.evidence.backend != EvidenceBackend::File {
            bail!("--write needs the file evidence backend");
        }
        let log = FileEvidenceLog::open(&config.evidence.log_dir).await?;
        let path = log.write_meta(&digest).await?;
        info!(path = %path.display(), "Log digest written");
    }

    output::print(&digest, format, |d| {
        format!(
            "scenario     {}\nruns         {}\nsha256       {}\nmerkle_root  {}",
            d.scenario_id, d.run_count, d.sha256, d.merkle_root
        )
    })
}

#[derive(Debug, Serialize)]
struct ScenarioSummary {
    scenario_id: ScenarioId,
    title: String,
    rules: usize,
    criteria: usize,
}

pub async fn scenarios(config: &AuditConfig, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = active_catalog(config)?;
    let summaries: Vec<ScenarioSummary> = catalog
        .scenarios
        .iter()
        .map(|s| ScenarioSummary {
            scenario_id: s.scenario_id.clone(),
            title: s.title.clone(),
            rules: s.rules.len(),
            criteria: s.criteria.len(),
        })
        .collect();

    output::print(&summaries, format, |summaries| {
        summaries
            .iter()
            .map(|s| format!("{:<6} {}", s.scenario_id, s.title))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn catalog(config: &AuditConfig) -> anyhow::Result<()> {
    let catalog = active_catalog(config)?;
    print!("{}", serde_yaml::to_string(&catalog)?);
    Ok(())
}

fn active_catalog(config: &AuditConfig) -> anyhow::Result<ScenarioCatalog> {
    Ok(match &config.catalog.path {
        Some(path) => load_catalog(path)?,
        None => ScenarioCatalog::standard(),
    })
}
