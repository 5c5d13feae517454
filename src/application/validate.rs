//! Validate Use Case
//!
//! Loads every PAL document under a path, resolves assembly imports and
//! reports what would break compilation (errors) next to what only looks
//! suspicious (warnings, e.g. template placeholders no variable declares).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::domain::entities::PromptAssembly;
use crate::domain::services::{analyze_template_variables, Resolver};
use crate::domain::value_objects::{ArtifactKind, Locator, ASSEMBLY_SUFFIX, LIBRARY_SUFFIX};
use crate::error::{PalError, PalResult};
use crate::infrastructure::loader::FsLoader;

/// Names every template may reference without declaring them.
const IMPLICIT_NAMES: &[&str] = &["loop", "super"];

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidation {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// `id@version` when the document loaded.
    pub key: Option<String>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub files: Vec<FileValidation>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.files.len() - self.valid_count()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.warnings.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.invalid_count() == 0
    }
}

/// Placeholders referenced by `assembly` that are neither declared
/// variables nor import aliases.
pub fn undeclared_template_variables(assembly: &PromptAssembly) -> BTreeSet<String> {
    let mut referenced = analyze_template_variables(assembly);
    for variable in &assembly.variables {
        referenced.remove(&variable.name);
    }
    for import in &assembly.imports {
        referenced.remove(&import.alias);
    }
    for name in IMPLICIT_NAMES {
        referenced.remove(*name);
    }
    referenced
}

pub struct ValidateUseCase {
    loader: FsLoader,
}

impl Default for ValidateUseCase {
    fn default() -> Self {
        Self::new(FsLoader::new())
    }
}

impl ValidateUseCase {
    pub fn new(loader: FsLoader) -> Self {
        Self { loader }
    }

    /// Validate a single file, or every PAL document in a directory.
    pub async fn execute(&self, path: &Path, recursive: bool) -> PalResult<ValidationReport> {
        let files = if path.is_dir() {
            discover(path, recursive)
        } else if path.exists() {
            vec![path.to_path_buf()]
        } else {
            return Err(PalError::Load {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        };

        let mut report = ValidationReport::default();
        for file in files {
            report.files.push(self.validate_file(&file).await);
        }
        Ok(report)
    }

    pub async fn validate_file(&self, path: &Path) -> FileValidation {
        let kind = Locator::from(path).kind();
        let mut outcome = FileValidation {
            path: path.to_path_buf(),
            kind,
            key: None,
            error: None,
            warnings: Vec::new(),
        };

        let result = match kind {
            ArtifactKind::Library => self
                .loader
                .load_library_async(path)
                .await
                .map(|library| {
                    outcome.key = Some(library.key().to_string());
                    outcome.warnings.extend(library.warnings);
                }),
            ArtifactKind::Assembly => match self.loader.load_assembly_async(path).await {
                Ok(assembly) => {
                    outcome.key = Some(assembly.key().to_string());
                    self.check_assembly(assembly, &mut outcome.warnings).await
                }
                Err(e) => Err(e),
            },
        };

        if let Err(e) = result {
            outcome.error = Some(e.to_string());
        }
        debug!(path = %path.display(), valid = outcome.is_valid(), "Validated");
        outcome
    }

    async fn check_assembly(
        &self,
        assembly: PromptAssembly,
        warnings: &mut Vec<String>,
    ) -> PalResult<()> {
        warnings.extend(assembly.warnings.iter().cloned());
        Resolver::new(&self.loader).resolve(&assembly).await?;
        for name in undeclared_template_variables(&assembly) {
            warnings.push(format!("undefined template variable '{}'", name));
        }
        Ok(())
    }
}

/// PAL documents under `dir`, sorted for stable output.
fn discover(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(dir);
    walker.hidden(true).git_ignore(true);
    if !recursive {
        walker.max_depth(Some(1));
    }

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| is_pal_document(path))
        .collect();
    files.sort();
    files
}

fn is_pal_document(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.ends_with(ASSEMBLY_SUFFIX) || name.ends_with(LIBRARY_SUFFIX)
}
