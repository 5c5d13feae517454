//! Load → resolve → compile pipeline
//!
//! Provides one entry point for turning a `.pal` file plus variable values
//! into prompt text. Used by the compile, execute and evaluate commands.
//!
//! ## Flow
//!
//! 1. Load the root assembly (schema-validated)
//! 2. Resolve its import graph into a symbol table
//! 3. Compile the composition with the supplied variables

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::entities::PromptAssembly;
use crate::domain::ports::ArtifactLoader;
use crate::domain::services::{compile_with_report, CompileReport, Resolver, SymbolTable};
use crate::domain::value_objects::Locator;
use crate::error::{PalError, PalResult};
use crate::infrastructure::loader::FsLoader;

/// An assembly together with everything it imports.
#[derive(Debug, Clone)]
pub struct ResolvedAssembly {
    pub assembly: PromptAssembly,
    pub symbols: SymbolTable,
}

impl ResolvedAssembly {
    pub fn compile(&self, variables: &Map<String, Value>) -> PalResult<CompileReport> {
        compile_with_report(&self.assembly, variables, &self.symbols)
    }
}

/// Unified pipeline over one loader.
pub struct PromptPipeline<L: ArtifactLoader = FsLoader> {
    loader: L,
}

impl Default for PromptPipeline<FsLoader> {
    fn default() -> Self {
        Self::new(FsLoader::new())
    }
}

impl<L: ArtifactLoader> PromptPipeline<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load the assembly at `path`.
    pub async fn load(&self, path: &Path) -> PalResult<PromptAssembly> {
        let locator = Locator::from(path);
        let artifact = self.loader.load(&locator).await?;
        artifact
            .as_assembly()
            .cloned()
            .ok_or_else(|| PalError::Load {
                path: path.to_path_buf(),
                message: "expected a prompt assembly, found a component library".to_string(),
            })
    }

    pub async fn resolve(&self, assembly: PromptAssembly) -> PalResult<ResolvedAssembly> {
        let symbols = Resolver::new(&self.loader).resolve(&assembly).await?;
        debug!(
            prompt = %assembly.id,
            artifacts = symbols.len(),
            "Resolved imports"
        );
        Ok(ResolvedAssembly { assembly, symbols })
    }

    /// Load and resolve `path`.
    pub async fn prepare(&self, path: &Path) -> PalResult<ResolvedAssembly> {
        let assembly = self.load(path).await?;
        self.resolve(assembly).await
    }

    /// Load, resolve and compile `path`.
    pub async fn compile_file(
        &self,
        path: &Path,
        variables: &Map<String, Value>,
    ) -> PalResult<(ResolvedAssembly, CompileReport)> {
        let resolved = self.prepare(path).await?;
        let report = resolved.compile(variables)?;
        Ok((resolved, report))
    }
}
