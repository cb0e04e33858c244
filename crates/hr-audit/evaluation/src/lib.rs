//! HR Audit Evaluation - turns scoring traces into verdicts and action items.
//!
//! [`CriteriaEvaluator`] checks a scenario's criteria against a trace and
//! aggregates the required ones into a scenario verdict.
//! [`MitigationPlanner`] fills the template keyed by the exact set of
//! violation codes of a failing run.

#![deny(unsafe_code)]

pub mod criteria;
pub mod mitigation;

pub use criteria::CriteriaEvaluator;
pub use mitigation::MitigationPlanner;
