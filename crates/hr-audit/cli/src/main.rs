//! hr-audit - run compliance scenarios and inspect their evidence logs
//!
//! - `run`: score a candidate profile against a scenario and append evidence
//! - `verify`: recompute every record hash and chain link of a scenario log
//! - `digest`: SHA-256 and Merkle root of a scenario log
//! - `scenarios` / `catalog`: inspect the active scenario catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use hr_audit_runtime::AuditConfig;
use output::OutputFormat;

/// HR Audit CLI
#[derive(Parser)]
#[command(name = "hr-audit")]
#[command(about = "HR Audit - scoring compliance harness with hash-chained evidence", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HR_AUDIT_CONFIG")]
    config: Option<String>,

    /// Scenario catalog (YAML); the built-in catalog is used when absent
    #[arg(long, env = "HR_AUDIT_CATALOG_FILE")]
    catalog: Option<PathBuf>,

    /// Evidence log directory
    #[arg(long, env = "HR_AUDIT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "HR_AUDIT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "HR_AUDIT_LOG_JSON")]
    json: bool,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario against a candidate profile and append its evidence
    Run {
        /// Scenario id (e.g. SC06)
        #[arg(short, long)]
        scenario: String,

        /// Candidate profile (JSON object)
        #[arg(short, long, required_unless_present = "candidates")]
        profile: Option<PathBuf>,

        /// Candidate file (JSON object of id to profile)
        #[arg(long, requires = "candidate", conflicts_with = "profile")]
        candidates: Option<PathBuf>,

        /// Candidate id to fetch from --candidates
        #[arg(long, requires = "candidates")]
        candidate: Option<String>,
    },

    /// Verify the hash chain of one scenario log, or of all logs
    Verify {
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// Print the digest of a scenario log
    Digest {
        #[arg(short, long)]
        scenario: String,

        /// Also write `<scenario>.meta.json` next to the log
        #[arg(long)]
        write: bool,
    },

    /// List the scenarios of the active catalog
    Scenarios,

    /// Print the active catalog as YAML
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AuditConfig::load(cli.config.as_deref())?;
    if let Some(catalog) = cli.catalog.clone() {
        config.catalog.path = Some(catalog);
    }
    if let Some(log_dir) = cli.log_dir.clone() {
        config.evidence.log_dir = log_dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Run {
            scenario,
            profile,
            candidates,
            candidate,
        } => {
            let source = match (profile, candidates, candidate) {
                (Some(path), _, _) => commands::ProfileSource::File(path),
                (None, Some(file), Some(id)) => commands::ProfileSource::Repository { file, id },
                _ => anyhow::bail!("either --profile or --candidates with --candidate is required"),
            };
            commands::run(&config, &scenario, source, cli.output).await
        }
        Commands::Verify { scenario } => {
            commands::verify(&config, scenario.as_deref(), cli.output).await
        }
        Commands::Digest { scenario, write } => {
            commands::digest(&config, &scenario, write, cli.output).await
        }
        Commands::Scenarios => commands::scenarios(&config, cli.output).await,
        Commands::Catalog => commands::catalog(&config).await,
    }
}
