//! HR Audit Evidence - tamper-evident audit records.
//!
//! An [`EvidenceRecord`] has thirteen fixed sections. The `provenance`
//! section links it to the previous record of the same scenario log:
//! `record_hash = SHA-256(canonical(other sections) || parent_hash)`.
//!
//! Building is pure. Appending to a log is the ledger's job.

#![deny(unsafe_code)]

pub mod builder;
pub mod canonical;
pub mod error;
pub mod record;
pub mod verify;

pub use builder::{EvidenceBuilder, EvidenceInput};
pub use canonical::{canonical_json, record_hash};
pub use error::EvidenceError;
pub use record::{
    ActualResults, ConfigurationStack, EvaluationSection, EvidenceRecord, ExecutionContext,
    FailureEvidence, MitigationSection, Provenance, RegulatoryScope, ScenarioSection,
    SuccessEvidence, SystemUnderTest, TestStep, Verdict, GENESIS_HASH, HASH_ALGORITHM,
    SCHEMA_VERSION,
};
pub use verify::{verify_chain, verify_raw_lines, verify_record, ChainVerification};
