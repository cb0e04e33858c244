//! Layered runtime configuration: defaults, then an optional file, then
//! `HR_AUDIT_*` environment variables (`HR_AUDIT_EVIDENCE__LOG_DIR=...`).

use hr_audit_evidence::{ConfigurationStack, ExecutionContext, SystemUnderTest};
use hr_audit_types::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub evidence: EvidenceConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub system_under_test: SystemUnderTest,

    #[serde(default)]
    pub configuration_stack: ConfigurationStack,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where evidence logs live and how long their I/O may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default)]
    pub backend: EvidenceBackend,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,

    /// Upper bound on waiting for another run's append to the same scenario.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            backend: EvidenceBackend::default(),
            log_dir: default_log_dir(),
            io_timeout_ms: default_io_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl EvidenceConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceBackend {
    Memory,
    #[default]
    File,
}

/// Scenario catalog source. Without a path the built-in standard catalog is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_executed_by")]
    pub executed_by: String,

    #[serde(default = "default_execution_environment")]
    pub execution_environment: String,

    /// Timeout for fetching a candidate profile from a repository.
    #[serde(default = "default_profile_timeout_ms")]
    pub profile_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            executed_by: default_executed_by(),
            execution_environment: default_execution_environment(),
            profile_timeout_ms: default_profile_timeout_ms(),
        }
    }
}

impl ExecutionConfig {
    /// A fresh context for one run, stamped now.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(&self.executed_by, &self.execution_environment)
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("runs/evidence_jsonl")
}
fn default_io_timeout_ms() -> u64 {
    5_000
}
fn default_lock_timeout_ms() -> u64 {
    20_000
}
fn default_executed_by() -> String {
    "hr-audit".to_string()
}
fn default_execution_environment() -> String {
    "local".to_string()
}
fn default_profile_timeout_ms() -> u64 {
    5_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl AuditConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&str>) -> AuditResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AuditConfig::default()).map_err(config_error)?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HR_AUDIT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)
    }
}

fn config_error(e: config::ConfigError) -> AuditError {
    AuditError::config(format!("failed to load configuration: {}", e))
}
