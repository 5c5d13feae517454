//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod artifact_loader;
pub mod audit_sink;
pub mod model_client;

pub use artifact_loader::ArtifactLoader;
pub use audit_sink::AuditSink;
pub use model_client::{GenerateRequest, Generation, ModelClient, ModelError};
