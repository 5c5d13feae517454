use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use pal::application::PromptPipeline;
use tracing::warn;

use super::{load_variables, write_output};
use crate::cli::VarsArgs;

pub async fn cmd_compile(file: &Path, vars: &VarsArgs, output: Option<&Path>) -> Result<ExitCode> {
    let variables = load_variables(vars)?;
    let (_, report) = PromptPipeline::default()
        .compile_file(file, &variables)
        .await?;

    for warning in &report.warnings {
        warn!("{warning}");
    }

    match output {
        Some(path) => {
            write_output(path, &report.text)?;
            eprintln!("✓ Compiled prompt written to {}", path.display());
        }
        None => println!("{}", report.text),
    }
    Ok(ExitCode::SUCCESS)
}
