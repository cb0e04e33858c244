//! HR Audit Ledger - append-only evidence logs, one per scenario.
//!
//! Each record's parent hash is the hash of the record before it, so appends
//! to one scenario log are serialized: [`EvidenceLedger::append_with`] holds
//! the scenario's lock across "read head hash, build record, append". Logs of
//! different scenarios never contend.

#![deny(unsafe_code)]

pub mod digest;
pub mod error;
pub mod file;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod traits;


pub use digest::{merkle_root, LogDigest};
pub use error::{LedgerError, LedgerResult};
pub use file::FileEvidenceLog;
pub use ledger::EvidenceLedger;
pub use locks::ScenarioLocks;
pub use memory::MemoryEvidenceLog;
pub use traits::EvidenceLog;
