//! AuditSink port
//!
//! Append-only destination for execution audit records. Implementations
//! may fail; the executor treats every failure as non-fatal.

use std::io;

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &Value) -> io::Result<()>;
}
