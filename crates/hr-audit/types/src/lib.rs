//! HR Audit Types: the shared vocabulary of the evaluation-and-evidence pipeline.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`CandidateProfile`]: immutable, caller-supplied field mapping
//! - [`ScenarioCatalog`]: rules, criteria, mitigation templates and lexicon,
//!   loaded once and never mutated at runtime
//! - [`ScoringTrace`]: what the scoring engine produced for one profile
//! - [`EvaluationResult`] / [`ScenarioEvaluation`]: per-criterion verdicts
//! - [`MitigationPlan`]: action items for a failing run
//! - [`AuditError`]: the four failure kinds every entry point reports

#![deny(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod ids;
pub mod profile;
mod standard;
pub mod trace;
pub mod verdict;

pub use catalog::{
    Adjustment, ComparisonOperator, Criterion, CriterionExpression, Gender, Lexicon,
    MitigationActionTemplate, MitigationTemplate, Predicate, Rule, Scenario, ScenarioCatalog,
    SesLevel, Severity, TestCase, TraceMetric, MAX_DEADLINE_OFFSET_DAYS,
};
pub use error::{AuditError, AuditResult, ExecutionFailure};
pub use ids::{CriterionId, ScenarioId};
pub use profile::CandidateProfile;
pub use trace::{AppliedAdjustment, ScoringTrace};
pub use verdict::{EvaluationResult, MitigationAction, MitigationPlan, ScenarioEvaluation};
