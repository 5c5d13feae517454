//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `loader/` - Artifact loading from disk and HTTP(S), schema validation
//! - `clients/` - Model clients (mock, OpenAI, Anthropic) and retry policy
//! - `audit/` - JSON-lines execution audit log

pub mod audit;
pub mod clients;
pub mod loader;

// Re-export for convenience
pub use audit::JsonlAuditLog;
pub use clients::{build_client, AnthropicClient, MockClient, OpenAiClient, RetryConfig};
pub use loader::FsLoader;
