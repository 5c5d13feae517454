//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `PromptPipeline` - Load, resolve and compile an assembly
//! - `PromptExecutor` - Run compiled prompts against a model client
//! - `ValidateUseCase` - Check PAL documents, collecting warnings
//! - `EvaluationRunner` - Drive an assembly through an evaluation suite

pub mod evaluation;
pub mod executor;
pub mod pipeline;
pub mod validate;

pub use evaluation::{check_assertion, load_suite, EvaluationReporter, EvaluationRunner};
pub use executor::{ExecuteOptions, PromptExecutor};
pub use pipeline::{PromptPipeline, ResolvedAssembly};
pub use validate::{undeclared_template_variables, FileValidation, ValidateUseCase, ValidationReport};
