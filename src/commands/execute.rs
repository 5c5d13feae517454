use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use pal::application::PromptPipeline;
use pal::config::Config;

use super::{build_executor, execute_options, load_variables, write_output};
use crate::cli::{ModelArgs, VarsArgs};

pub struct ExecuteArgs<'a> {
    pub file: &'a Path,
    pub model: &'a ModelArgs,
    pub vars: &'a VarsArgs,
    pub log_file: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub json: bool,
}

pub async fn cmd_execute(config: &Config, args: ExecuteArgs<'_>) -> Result<ExitCode> {
    let variables = load_variables(args.vars)?;
    let options = execute_options(config, args.model, None)?;
    let executor = build_executor(config, args.model, args.log_file)?;

    let (resolved, report) = PromptPipeline::default()
        .compile_file(args.file, &variables)
        .await?;
    let result = executor
        .execute(&report.text, &resolved.assembly, &options)
        .await?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&result)?
    } else {
        result.response.clone()
    };

    match args.output {
        Some(path) => {
            write_output(path, &rendered)?;
            eprintln!("✓ Response written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if !args.json {
        let tokens = |t: Option<u32>| t.map_or_else(|| "?".to_string(), |n| n.to_string());
        let cost = result
            .cost_usd
            .map(|c| format!(" | Cost: ${c:.6}"))
            .unwrap_or_default();
        eprintln!(
            "Model: {} | Tokens: {}→{} | Time: {:.1}ms{}",
            result.model,
            tokens(result.input_tokens),
            tokens(result.output_tokens),
            result.execution_time_ms,
            cost
        );
    }
    Ok(ExitCode::SUCCESS)
}
