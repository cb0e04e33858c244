//! HR Audit Runtime - wires the pipeline together.
//!
//! - [`AuditConfig`]: layered configuration (defaults, file, `HR_AUDIT_*` env)
//! - [`load_catalog`]: YAML scenario catalog, validated on load
//! - [`CandidateRepository`]: explicit profile source, created per run
//! - [`AuditPipeline`]: score, evaluate, plan, build and persist one run

#![deny(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod repository;

pub use catalog::{load_catalog, parse_catalog};
pub use config::{
    AuditConfig, CatalogConfig, EvidenceBackend, EvidenceConfig, ExecutionConfig, LoggingConfig,
};
pub use pipeline::{AuditPipeline, RunReport, RunStage};
pub use repository::{CandidateRepository, InMemoryCandidateRepository};
