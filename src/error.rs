//! Error types for PAL
//!
//! Every pipeline stage fails with a [`PalError`]. Each variant renders a
//! human-readable message and exposes a structured [`ErrorContext`] so the
//! CLI (and any other caller) can print the details that led to the failure.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for PAL operations
pub type PalResult<T> = Result<T, PalError>;

/// Ordered key → value details attached to an error.
pub type ErrorContext = IndexMap<String, Value>;

/// Main error type for PAL operations
#[derive(Error, Debug)]
pub enum PalError {
    /// Artifact file is missing, unreadable or not well-formed
    #[error("failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Artifact parsed but violates the schema
    #[error("invalid {kind} {}: {message}", path.display())]
    Validation {
        path: PathBuf,
        kind: &'static str,
        message: String,
        field: Option<String>,
    },

    /// An import could not be resolved
    #[error("failed to resolve import '{alias}' of '{importer}': {message}")]
    Resolve {
        importer: String,
        alias: String,
        locator: String,
        message: String,
    },

    /// The import graph contains a cycle
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// A required variable has no supplied value and no default
    #[error("missing required variable '{name}' for prompt '{prompt_id}'")]
    MissingVariable { prompt_id: String, name: String },

    /// A referenced component or alias is not present in the symbol table
    #[error("component '{alias}.{component}' not found: {reason}")]
    MissingComponent {
        alias: String,
        component: String,
        reason: String,
    },

    /// Any other compile-time failure
    #[error("compilation of '{prompt_id}' failed: {message}")]
    Compile { prompt_id: String, message: String },

    /// The model-calling collaborator failed
    #[error("Execution failed for {prompt_id}: {message}")]
    Execute {
        prompt_id: String,
        model: String,
        message: String,
    },

    /// Configuration could not be read or parsed
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl PalError {
    /// Structured details for display and diagnostics.
    pub fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new();
        match self {
            PalError::Load { path, .. } => {
                ctx.insert("path".into(), json!(path.display().to_string()));
            }
            PalError::Validation {
                path, kind, field, ..
            } => {
                ctx.insert("path".into(), json!(path.display().to_string()));
                ctx.insert("kind".into(), json!(kind));
                if let Some(field) = field {
                    ctx.insert("field".into(), json!(field));
                }
            }
            PalError::Resolve {
                importer,
                alias,
                locator,
                ..
            } => {
                ctx.insert("importer".into(), json!(importer));
                ctx.insert("alias".into(), json!(alias));
                ctx.insert("locator".into(), json!(locator));
            }
            PalError::CircularDependency { cycle } => {
                ctx.insert("cycle".into(), json!(cycle));
            }
            PalError::MissingVariable { prompt_id, name } => {
                ctx.insert("prompt_id".into(), json!(prompt_id));
                ctx.insert("variable".into(), json!(name));
            }
            PalError::MissingComponent {
                alias, component, ..
            } => {
                ctx.insert("alias".into(), json!(alias));
                ctx.insert("component".into(), json!(component));
            }
            PalError::Compile { prompt_id, .. } => {
                ctx.insert("prompt_id".into(), json!(prompt_id));
            }
            PalError::Execute {
                prompt_id, model, ..
            } => {
                ctx.insert("prompt_id".into(), json!(prompt_id));
                ctx.insert("model".into(), json!(model));
            }
            PalError::Config { path, .. } => {
                ctx.insert("path".into(), json!(path.display().to_string()));
            }
        }
        ctx
    }

    /// True for load failures, including schema violations.
    pub fn is_load_error(&self) -> bool {
        matches!(self, PalError::Load { .. } | PalError::Validation { .. })
    }

    /// True for unresolvable imports and import cycles.
    pub fn is_resolver_error(&self) -> bool {
        matches!(
            self,
            PalError::Resolve { .. } | PalError::CircularDependency { .. }
        )
    }

    /// True for every compile-stage failure.
    pub fn is_compiler_error(&self) -> bool {
        matches!(
            self,
            PalError::Compile { .. }
                | PalError::MissingVariable { .. }
                | PalError::MissingComponent { .. }
        )
    }

    pub fn is_executor_error(&self) -> bool {
        matches!(self, PalError::Execute { .. })
    }
}
