//! Scenario catalog loading from YAML.

use hr_audit_types::{AuditError, AuditResult, ScenarioCatalog};
use std::path::Path;
use tracing::{info, warn};

/// Parse and validate a catalog document.
pub fn parse_catalog(yaml: &str) -> AuditResult<ScenarioCatalog> {
    let catalog: ScenarioCatalog = serde_yaml::from_str(yaml)
        .map_err(|e| AuditError::config(format!("invalid scenario catalog: {}", e)))?;
    catalog.validate()?;
    Ok(catalog)
}

/// Read, parse and validate the catalog at `path`.
pub fn load_catalog(path: &Path) -> AuditResult<ScenarioCatalog> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        AuditError::config(format!("cannot read catalog {}: {}", path.display(), e))
    })?;
    let catalog = parse_catalog(&yaml).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Scenario catalog rejected");
        e
    })?;
    info!(
        path = %path.display(),
        scenarios = catalog.scenarios.len(),
        rules = catalog.rules.len(),
        "Scenario catalog loaded"
    );
    Ok(catalog)
}
