//! Domain Entities
//!
//! - `PromptAssembly` - a versioned prompt definition (`*.pal`)
//! - `ComponentLibrary` - reusable templated components (`*.pal.lib`)
//! - `Artifact` - either of the above, as loaded
//! - `ExecutionResult` - one model call and its accounting
//! - `EvaluationSuite` - test cases driven through compile + execute

mod artifact;
mod assembly;
mod evaluation;
mod execution;
mod library;

pub use artifact::Artifact;
pub use assembly::{
    ComponentRef, CompositionEntry, Import, PromptAssembly, Variable, VariableType,
};
pub use evaluation::{
    Assertion, AssertionResult, EvaluationResult, EvaluationSuite, TestCase, TestResult,
};
pub use execution::ExecutionResult;
pub use library::{Component, ComponentLibrary, LibraryType};
