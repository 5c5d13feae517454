use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use pal::application::{EvaluationReporter, EvaluationRunner, PromptPipeline};
use pal::config::Config;

use super::{build_executor, execute_options, write_output};
use crate::cli::{ModelArgs, ReportFormat};

pub struct EvaluateArgs<'a> {
    pub suite: &'a Path,
    pub pal_file: Option<&'a Path>,
    pub model: &'a ModelArgs,
    pub format: ReportFormat,
    pub output: Option<&'a Path>,
}

pub async fn cmd_evaluate(config: &Config, args: EvaluateArgs<'_>) -> Result<ExitCode> {
    let options = execute_options(config, args.model, Some("mock"))?;
    let executor = build_executor(config, args.model, None)?;
    let runner = EvaluationRunner::new(PromptPipeline::default(), executor);

    let result = runner.run(args.suite, args.pal_file, &options).await?;

    let reporter = EvaluationReporter;
    let report = match args.format {
        ReportFormat::Json => serde_json::to_string_pretty(&reporter.json_report(&result))?,
        ReportFormat::Console => reporter.console_report(&result),
    };

    match args.output {
        Some(path) => {
            write_output(path, &report)?;
            eprintln!("✓ Evaluation report written to {}", path.display());
        }
        None => println!("{report}"),
    }

    if result.failed_tests() == 0 {
        eprintln!("✓ All {} tests passed", result.total_tests());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "⚠ {}/{} tests failed",
            result.failed_tests(),
            result.total_tests()
        );
        for test in result.test_results.iter().filter(|t| !t.passed) {
            eprintln!("✗ {}", test.name);
        }
        Ok(ExitCode::FAILURE)
    }
}
