//! HR Audit Scoring - rule-table interpreter for candidate profiles.
//!
//! The engine computes a skills-only base score, then walks the scenario's
//! rules in declaration order. Every predicate sees the original profile, never
//! the running score, so which rules fire does not depend on their order.
//! Firing adjustments are combined with commutative operators and the result
//! is clamped to `[0, 100]`.

#![deny(unsafe_code)]

pub mod inference;
pub mod predicate;

use hr_audit_types::{
    Adjustment, AppliedAdjustment, AuditError, AuditResult, CandidateProfile, Rule, Scenario,
    ScenarioCatalog, ScenarioId, ScoringTrace,
};
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

pub const BASE_SCORE: f64 = 50.0;
pub const SKILL_MATCH_POINTS: f64 = 25.0;
pub const MAX_SCORE: f64 = 100.0;
pub const MIN_SCORE: f64 = 0.0;

/// Scores candidate profiles against a scenario's rule table.
#[derive(Clone)]
pub struct ScoringEngine {
    catalog: Arc<ScenarioCatalog>,
}

impl ScoringEngine {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    /// Score a profile. Bounded-random rules draw from the thread RNG.
    pub fn score(
        &self,
        scenario_id: &ScenarioId,
        profile: &CandidateProfile,
    ) -> AuditResult<ScoringTrace> {
        self.score_with_rng(scenario_id, profile, &mut rand::thread_rng())
    }

    /// Score a profile, drawing bounded-random factors from `rng`.
    pub fn score_with_rng<R: Rng>(
        &self,
        scenario_id: &ScenarioId,
        profile: &CandidateProfile,
        rng: &mut R,
    ) -> AuditResult<ScoringTrace> {
        let scenario = self.catalog.scenario(scenario_id)?;
        let rules = self.catalog.rules_for(scenario)?;
        let base_score = base_score(scenario, profile)?;

        let mut factors = Vec::new();
        let mut percents = Vec::new();
        let mut adjustments = Vec::new();
        let mut violation_codes: Vec<String> = Vec::new();
        let mut article_violations: Vec<String> = Vec::new();
        let mut reasoning = Vec::new();
        let mut nondeterministic = false;

        for rule in rules {
            if !predicate::evaluate(&rule.predicate, profile, &self.catalog.lexicon) {
                continue;
            }

            let delta = match resolve(rule, rng) {
                Resolved::Factor(f) => {
                    factors.push(f);
                    (f - 1.0) * 100.0
                }
                Resolved::Percent(p) => {
                    percents.push(p);
                    p
                }
                Resolved::Flag => 0.0,
            };
            nondeterministic |= rule.adjustment.is_random();

            debug!(
                scenario_id = %scenario_id,
                rule = %rule.name,
                violation_code = %rule.violation_code,
                delta,
                "Rule fired"
            );

            adjustments.push(AppliedAdjustment {
                rule_name: rule.name.clone(),
                violation_code: rule.violation_code.clone(),
                delta,
            });
            if !violation_codes.contains(&rule.violation_code) {
                violation_codes.push(rule.violation_code.clone());
            }
            for article in &rule.article_references {
                if !article_violations.contains(article) {
                    article_violations.push(article.clone());
                }
            }
            if !rule.rationale.is_empty() {
                reasoning.push(rule.rationale.clone());
            }
        }

        let final_score = combine(base_score, &mut factors, &mut percents);

        info!(
            scenario_id = %scenario_id,
            base_score,
            final_score,
            violations = violation_codes.len(),
            "Profile scored"
        );

        Ok(ScoringTrace {
            scenario_id: scenario_id.clone(),
            base_score,
            adjustments,
            final_score,
            violation_codes,
            article_violations,
            reasoning,
            nondeterministic,
        })
    }
}

enum Resolved {
    Factor(f64),
    Percent(f64),
    Flag,
}

fn resolve<R: Rng>(rule: &Rule, rng: &mut R) -> Resolved {
    match &rule.adjustment {
        Adjustment::Multiplicative { factor } => Resolved::Factor(*factor),
        Adjustment::AdditivePercent { percent } => Resolved::Percent(*percent),
        Adjustment::BoundedRandom {
            min_factor,
            max_factor,
        } => {
            if min_factor >= max_factor {
                Resolved::Factor(*min_factor)
            } else {
                Resolved::Factor(rng.gen_range(*min_factor..=*max_factor))
            }
        }
        Adjustment::Flag => Resolved::Flag,
    }
}

/// `base * Π factors + base * Σ percents / 100`, clamped.
///
/// Operands are sorted first so the floating-point result is identical for
/// every permutation of the rule table.
fn combine(base: f64, factors: &mut [f64], percents: &mut [f64]) -> f64 {
    factors.sort_by(f64::total_cmp);
    percents.sort_by(f64::total_cmp);
    let product: f64 = factors.iter().product();
    let additive: f64 = percents.iter().sum();
    let score = base * product + base * additive / 100.0;
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// `50 + 25 × |skills ∩ required_skills|`, capped at 100.
pub fn base_score(scenario: &Scenario, profile: &CandidateProfile) -> AuditResult<f64> {
    let skills = profile.string_list("skills").ok_or_else(|| {
        AuditError::validation(format!(
            "scenario `{}` needs a `skills` list of strings in the profile",
            scenario.scenario_id
        ))
    })?;

    if let Some(missing) = scenario
        .required_fields
        .iter()
        .find(|f| !profile.contains(f))
    {
        return Err(AuditError::validation(format!(
            "scenario `{}` needs profile field `{}`",
            scenario.scenario_id, missing
        )));
    }

    let candidate: BTreeSet<String> = skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let matched = scenario
        .required_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect::<BTreeSet<_>>()
        .intersection(&candidate)
        .count();

    Ok((BASE_SCORE + SKILL_MATCH_POINTS * matched as f64).min(MAX_SCORE))
}
