use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use pal::application::ValidateUseCase;

pub async fn cmd_validate(path: &Path, recursive: bool) -> Result<ExitCode> {
    let report = ValidateUseCase::default().execute(path, recursive).await?;

    if report.files.is_empty() {
        println!("No PAL files found to validate");
        return Ok(ExitCode::SUCCESS);
    }

    for file in &report.files {
        let status = match (&file.error, file.warnings.is_empty()) {
            (Some(_), _) => "✗ invalid",
            (None, true) => "✓ valid",
            (None, false) => "⚠ warning",
        };
        let key = file
            .key
            .as_deref()
            .map(|k| format!(" ({k})"))
            .unwrap_or_default();
        println!("{status:<10} {} [{}]{key}", file.path.display(), file.kind);
        if let Some(error) = &file.error {
            println!("    error: {error}");
        }
        for warning in &file.warnings {
            println!("    warning: {warning}");
        }
    }

    println!(
        "\nSummary: {}/{} files valid, {} warning(s)",
        report.valid_count(),
        report.files.len(),
        report.warning_count()
    );

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
