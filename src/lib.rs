//! PAL - Prompt Assembly Language
//!
//! PAL treats prompts as versioned software artifacts. An assembly (`*.pal`)
//! declares typed variables, imports component libraries (`*.pal.lib`) by
//! alias and lists a composition order. The pipeline loads, resolves,
//! compiles and finally executes it against a model client.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{ExecuteOptions, PromptExecutor, PromptPipeline};
pub use config::Config;
pub use domain::entities::{
    Component, ComponentLibrary, CompositionEntry, ExecutionResult, PromptAssembly, Variable,
    VariableType,
};
pub use domain::services::{analyze_template_variables, compile, resolve, SymbolTable};
pub use error::{PalError, PalResult};
pub use infrastructure::FsLoader;
