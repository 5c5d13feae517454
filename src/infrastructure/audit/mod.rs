//! Execution audit log
//!
//! Append-only JSON-lines record of executor phase transitions.

mod jsonl;

pub use jsonl::JsonlAuditLog;
