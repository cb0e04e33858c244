//! Scenario catalog: the configuration data the pipeline interprets.
//!
//! Rules, criteria and mitigation templates are plain data. Adding a scenario
//! is a catalog change, never a code change: the scoring engine walks the
//! rule table generically and the evaluator walks the criteria table the same way.

use crate::error::{AuditError, AuditResult};
use crate::ids::{CriterionId, ScenarioId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Inferred gender, as the biased lexicon sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

/// Socio-economic class inferred from a postal code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SesLevel {
    High,
    Medium,
    Low,
}

/// Closed predicate vocabulary. Every predicate reads the original profile
/// (and the catalog lexicon) only, never an intermediate score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals a JSON value (strings compared case-insensitively).
    Equals { field: String, value: Value },
    /// Field is present and not empty/false/zero.
    Truthy { field: String },
    /// Field is present and not null.
    Present { field: String },
    /// Field text (string or list of strings) contains any needle, case-insensitive.
    TextContains { field: String, needles: Vec<String> },
    /// First token of `name` maps to `gender` with confidence above 0.7.
    InferredGender { gender: Gender },
    /// Any token of `name` is a lexicon minority token.
    MinorityName,
    /// `reference_year - field` is strictly greater than `years`.
    YearsSinceExceeds { field: String, years: i64 },
    /// Postal code at `field` is classified as `level`.
    SesLevelIs { field: String, level: SesLevel },
    /// Some item of the list at `field` has `item_field` within `[min, max]`.
    AnyItemInRange {
        field: String,
        item_field: String,
        min: f64,
        max: f64,
    },
    /// Both lists are non-empty and `field` has entries not in `minus`.
    SetDifference { field: String, minus: String },
    /// Numeric field (or numeric string) is below `threshold`.
    /// `missing_as` substitutes a value when the field is absent.
    NumberBelow {
        field: String,
        threshold: f64,
        #[serde(default)]
        missing_as: Option<f64>,
    },
    /// The list at `field` has no entry equal to `value`, case-insensitive.
    ListLacks { field: String, value: String },
    /// The scalar at `field` appears in the list at `list`.
    ValueInList { field: String, list: String },
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
    Not { predicate: Box<Predicate> },
}

/// How a firing rule moves the score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// Scale the base score by `factor` (0.92 is an 8% penalty).
    Multiplicative { factor: f64 },
    /// Add `percent` of the base score.
    AdditivePercent { percent: f64 },
    /// Scale by a factor drawn uniformly from `[min_factor, max_factor]`.
    /// The only source of run-to-run variance in the pipeline.
    BoundedRandom { min_factor: f64, max_factor: f64 },
    /// Record the violation without moving the score.
    Flag,
}

impl Adjustment {
    pub fn is_random(&self) -> bool {
        matches!(self, Self::BoundedRandom { .. })
    }

    fn check(&self, rule: &str) -> AuditResult<()> {
        let bad = match self {
            Self::Multiplicative { factor } => !factor.is_finite() || *factor < 0.0,
            Self::AdditivePercent { percent } => !percent.is_finite(),
            Self::BoundedRandom {
                min_factor,
                max_factor,
            } => {
                !min_factor.is_finite()
                    || !max_factor.is_finite()
                    || *min_factor < 0.0
                    || min_factor > max_factor
            }
            Self::Flag => false,
        };
        if bad {
            return Err(AuditError::config(format!(
                "rule `{}` has an invalid adjustment {:?}",
                rule, self
            )));
        }
        Ok(())
    }
}

/// A predicate-adjustment pair tagged with a violation code and article references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Scenario code that introduced the rule (e.g. `SC06`).
    pub scenario_id: ScenarioId,
    /// Unique rule name within the catalog.
    pub name: String,
    pub predicate: Predicate,
    pub adjustment: Adjustment,
    pub violation_code: String,
    pub article_references: Vec<String>,
    /// Text the biased system emits when the rule fires.
    #[serde(default)]
    pub rationale: String,
}

/// Numeric view over a scoring trace that criteria compare against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMetric {
    FinalScore,
    BaseScore,
    ViolationCount,
    ArticleViolationCount,
    AdjustmentCount,
    /// `final_score / base_score`, 1.0 when the base is zero.
    ScoreRatio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl ComparisonOperator {
    const EPSILON: f64 = 1e-9;

    pub fn apply(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => actual < threshold,
            Self::Le => actual <= threshold + Self::EPSILON,
            Self::Eq => (actual - threshold).abs() <= Self::EPSILON,
            Self::Ne => (actual - threshold).abs() > Self::EPSILON,
            Self::Ge => actual + Self::EPSILON >= threshold,
            Self::Gt => actual > threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
        }
    }
}

/// Declarative expression over a scoring trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionExpression {
    Compare {
        metric: TraceMetric,
        operator: ComparisonOperator,
        threshold: f64,
    },
    ViolationAbsent { code: String },
}

impl CriterionExpression {
    /// Human-readable rendering for evidence records.
    pub fn describe(&self) -> String {
        match self {
            Self::Compare {
                metric,
                operator,
                threshold,
            } => format!("{:?} {} {}", metric, operator.symbol(), threshold),
            Self::ViolationAbsent { code } => format!("{} not in violation_codes", code),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Must pass for the scenario to pass.
    Required,
    /// Recorded, never flips the verdict.
    Advisory,
}

/// Named pass/fail check over a scoring trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    #[serde(default)]
    pub description: String,
    pub expression: CriterionExpression,
    /// Whether the expression is expected to hold for the criterion to pass.
    #[serde(default = "default_true")]
    pub expected_outcome: bool,
    pub severity: Severity,
}

/// Longest deadline a mitigation action may carry, in days.
pub const MAX_DEADLINE_OFFSET_DAYS: i64 = 3650;

/// One action item of a mitigation template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationActionTemplate {
    /// May contain `{scenario_id}` and `{violation_codes}` placeholders.
    pub action: String,
    pub owner: String,
    pub deadline_offset_days: i64,
}

/// Mitigation template keyed by an exact set of violation codes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationTemplate {
    pub template_id: String,
    /// Restricts the template to one scenario; `None` makes it global.
    #[serde(default)]
    pub scenario_id: Option<ScenarioId>,
    pub violation_codes: BTreeSet<String>,
    #[serde(default)]
    pub summary: String,
    pub actions: Vec<MitigationActionTemplate>,
}

/// Inference tables the biased system uses on names and addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub female_names: BTreeSet<String>,
    #[serde(default)]
    pub male_names: BTreeSet<String>,
    #[serde(default)]
    pub minority_tokens: BTreeSet<String>,
    #[serde(default)]
    pub high_ses_postal_codes: BTreeSet<String>,
    #[serde(default)]
    pub low_ses_postal_codes: BTreeSet<String>,
    /// Year used by age-proxy predicates.
    #[serde(default = "default_reference_year")]
    pub reference_year: i64,
}

/// Test case metadata recorded verbatim in evidence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub test_case_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub test_steps_planned: Vec<String>,
    #[serde(default)]
    pub expected_results: String,
    #[serde(default)]
    pub pass_criteria: Vec<String>,
    #[serde(default)]
    pub fail_criteria: Vec<String>,
    #[serde(default)]
    pub linked_requirements: Vec<String>,
    #[serde(default)]
    pub test_data_refs: Vec<String>,
    #[serde(default = "default_test_level")]
    pub test_level: String,
}

/// A named test configuration bundling rules, criteria and metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: ScenarioId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default = "default_scenario_type")]
    pub scenario_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub applicable_articles: Vec<String>,
    pub required_skills: Vec<String>,
    /// Dotted profile paths that must be present besides `skills`.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Rule names, in declaration order.
    pub rules: Vec<String>,
    /// Criterion ids, in evaluation order.
    pub criteria: Vec<CriterionId>,
    #[serde(default)]
    pub test_case: Option<TestCase>,
}

/// Everything the pipeline needs, loaded once and immutable at runtime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    #[serde(default)]
    pub lexicon: Lexicon,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub mitigation_templates: Vec<MitigationTemplate>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    pub fn scenario(&self, scenario_id: &ScenarioId) -> AuditResult<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| &s.scenario_id == scenario_id)
            .ok_or_else(|| AuditError::config(format!("unknown scenario `{}`", scenario_id)))
    }

    pub fn rule(&self, name: &str) -> AuditResult<&Rule> {
        self.rules
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| AuditError::config(format!("undefined rule `{}`", name)))
    }

    pub fn criterion(&self, id: &CriterionId) -> AuditResult<&Criterion> {
        self.criteria
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| AuditError::config(format!("undefined criterion `{}`", id)))
    }

    /// Resolve a scenario's rule names in declaration order.
    pub fn rules_for(&self, scenario: &Scenario) -> AuditResult<Vec<&Rule>> {
        scenario.rules.iter().map(|name| self.rule(name)).collect()
    }

    /// Resolve a scenario's criteria in configured order.
    pub fn criteria_for(&self, scenario: &Scenario) -> AuditResult<Vec<&Criterion>> {
        scenario.criteria.iter().map(|id| self.criterion(id)).collect()
    }

    /// Check that names are unique, references resolve and adjustments are sane.
    pub fn validate(&self) -> AuditResult<()> {
        let mut rule_names = HashSet::new();
        for rule in &self.rules {
            if !rule_names.insert(rule.name.as_str()) {
                return Err(AuditError::config(format!("duplicate rule `{}`", rule.name)));
            }
            rule.adjustment.check(&rule.name)?;
        }

        let mut criterion_ids = HashSet::new();
        for criterion in &self.criteria {
            if !criterion_ids.insert(&criterion.id) {
                return Err(AuditError::config(format!(
                    "duplicate criterion `{}`",
                    criterion.id
                )));
            }
        }

        let mut template_keys = HashSet::new();
        for template in &self.mitigation_templates {
            if !template_keys.insert((&template.scenario_id, &template.violation_codes)) {
                return Err(AuditError::config(format!(
                    "template `{}` duplicates the key of another template",
                    template.template_id
                )));
            }
            for item in &template.actions {
                if !(0..=MAX_DEADLINE_OFFSET_DAYS).contains(&item.deadline_offset_days) {
                    return Err(AuditError::config(format!(
                        "template `{}` has deadline offset {} days, expected 0..={}",
                        template.template_id, item.deadline_offset_days, MAX_DEADLINE_OFFSET_DAYS
                    )));
                }
            }
        }

        let mut scenario_ids = HashSet::new();
        for scenario in &self.scenarios {
            if !scenario_ids.insert(&scenario.scenario_id) {
                return Err(AuditError::config(format!(
                    "duplicate scenario `{}`",
                    scenario.scenario_id
                )));
            }
            self.rules_for(scenario)?;
            self.criteria_for(scenario)?;
        }

        for template in &self.mitigation_templates {
            if let Some(scope) = &template.scenario_id {
                if !scenario_ids.contains(scope) {
                    return Err(AuditError::config(format!(
                        "template `{}` is scoped to unknown scenario `{}`",
                        template.template_id, scope
                    )));
                }
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_reference_year() -> i64 {
    2024
}

fn default_test_level() -> String {
    "integration".to_string()
}

fn default_scenario_type() -> String {
    "bias_detection".to_string()
}
