//! PAL CLI - Prompt Assembly Language
//!
//! Usage: pal <COMMAND>
//!
//! Commands:
//!   compile   Compile a PAL file into prompt text
//!   execute   Compile a PAL file and send it to a model
//!   validate  Validate PAL files
//!   info      Show information about a PAL file
//!   evaluate  Run an evaluation suite against a PAL file

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pal::config::Config;
use pal::error::PalError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::execute::ExecuteArgs;
use commands::evaluate::EvaluateArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("pal={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let (config, warnings) = Config::load_with_warnings(path)?;
            for warning in &warnings {
                warn!("{warning}");
            }
            Ok(config.with_env_overrides())
        }
        None => {
            let cwd = std::env::current_dir().ok();
            Ok(Config::load_or_default(cwd.as_deref()))
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Compile { file, vars, output } => {
            commands::cmd_compile(file, vars, output.as_deref()).await
        }
        Commands::Execute {
            file,
            model,
            vars,
            log_file,
            output,
            json,
        } => {
            let args = ExecuteArgs {
                file,
                model,
                vars,
                log_file: log_file.as_deref(),
                output: output.as_deref(),
                json: *json,
            };
            commands::cmd_execute(&config, args).await
        }
        Commands::Validate { path, recursive } => commands::cmd_validate(path, *recursive).await,
        Commands::Info { file } => commands::cmd_info(file).await,
        Commands::Evaluate {
            suite,
            pal_file,
            model,
            format,
            output,
        } => {
            let args = EvaluateArgs {
                suite,
                pal_file: pal_file.as_deref(),
                model,
                format: *format,
                output: output.as_deref(),
            };
            commands::cmd_evaluate(&config, args).await
        }
    }
}

/// Domain errors print their context; anything else is unexpected.
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<PalError>() {
        Some(pal_err) => {
            eprintln!("Error: {pal_err}");
            let context = pal_err.context();
            if !context.is_empty() {
                eprintln!("Context:");
                for (key, value) in &context {
                    match value {
                        serde_json::Value::String(s) => eprintln!("  {key}: {s}"),
                        other => eprintln!("  {key}: {other}"),
                    }
                }
            }
        }
        None => eprintln!("Unexpected error: {err:#}"),
    }
}
