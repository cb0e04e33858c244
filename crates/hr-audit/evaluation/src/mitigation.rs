use chrono::{DateTime, Duration, Utc};
use hr_audit_types::{
    AuditError, AuditResult, MitigationAction, MitigationPlan, MitigationTemplate,
    ScenarioCatalog, ScenarioId,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Selects and fills mitigation templates by exact violation-code set.
#[derive(Clone)]
pub struct MitigationPlanner {
    catalog: Arc<ScenarioCatalog>,
}

impl MitigationPlanner {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    /// Build the plan for `violation_codes`.
    ///
    /// Empty codes give an empty plan. Templates scoped to the scenario win
    /// over global ones; an unmapped code set is a config error. Deadlines are
    /// `execution_time` plus each action's offset.
    pub fn plan(
        &self,
        scenario_id: &ScenarioId,
        violation_codes: &[String],
        execution_time: DateTime<Utc>,
    ) -> AuditResult<MitigationPlan> {
        if violation_codes.is_empty() {
            return Ok(MitigationPlan::empty());
        }
        self.catalog.scenario(scenario_id)?;

        let key: BTreeSet<String> = violation_codes.iter().cloned().collect();
        let template = self.lookup(scenario_id, &key).ok_or_else(|| {
            warn!(scenario_id = %scenario_id, codes = ?key, "No mitigation template");
            AuditError::config(format!(
                "no mitigation template for scenario `{}` and violation codes [{}]",
                scenario_id,
                join(&key)
            ))
        })?;

        let codes = join(&key);
        let mut actions = Vec::with_capacity(template.actions.len());
        for (i, item) in template.actions.iter().enumerate() {
            let deadline = Duration::try_days(item.deadline_offset_days)
                .and_then(|offset| execution_time.checked_add_signed(offset))
                .ok_or_else(|| {
                    AuditError::config(format!(
                        "template `{}` action {} has an unrepresentable deadline ({} days)",
                        template.template_id,
                        i + 1,
                        item.deadline_offset_days
                    ))
                })?;
            actions.push(MitigationAction {
                action_id: format!("{}-A{:02}", template.template_id, i + 1),
                action: item
                    .action
                    .replace("{scenario_id}", scenario_id.as_str())
                    .replace("{violation_codes}", &codes),
                owner: item.owner.clone(),
                deadline,
            });
        }

        info!(
            scenario_id = %scenario_id,
            template = %template.template_id,
            actions = actions.len(),
            "Mitigation planned"
        );

        Ok(MitigationPlan {
            template_id: Some(template.template_id.clone()),
            summary: template.summary.clone(),
            actions,
        })
    }

    fn lookup(&self, scenario_id: &ScenarioId, key: &BTreeSet<String>) -> Option<&MitigationTemplate> {
        let templates = &self.catalog.mitigation_templates;
        templates
            .iter()
            .find(|t| t.scenario_id.as_ref() == Some(scenario_id) && &t.violation_codes == key)
            .or_else(|| {
                templates
                    .iter()
                    .find(|t| t.scenario_id.is_none() && &t.violation_codes == key)
            })
    }
}

fn join(codes: &BTreeSet<String>) -> String {
    codes.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
