use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pal::config::ProviderKind;

/// PAL - Prompt Assembly Language
#[derive(Parser, Debug)]
#[command(name = "pal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./pal.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Variable inputs shared by commands that compile.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct VarsArgs {
    /// Variables as a JSON object
    #[arg(long)]
    pub vars: Option<String>,

    /// Load variables from a JSON or YAML file
    #[arg(long)]
    pub vars_file: Option<PathBuf>,
}

/// Model selection shared by `execute` and `evaluate`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Model to call
    #[arg(short, long)]
    pub model: Option<String>,

    /// Model provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// API key (default: the provider's environment variable)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Console,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a PAL file into prompt text
    Compile {
        /// Assembly file (*.pal)
        file: PathBuf,

        #[command(flatten)]
        vars: VarsArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a PAL file and send it to a model
    Execute {
        /// Assembly file (*.pal)
        file: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        vars: VarsArgs,

        /// Append audit records to this file (JSON lines)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full execution result as JSON
        #[arg(long, alias = "json-output")]
        json: bool,
    },

    /// Validate PAL files
    Validate {
        /// File or directory
        path: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show information about a PAL file
    Info {
        /// Assembly (*.pal) or library (*.pal.lib)
        file: PathBuf,
    },

    /// Run an evaluation suite against a PAL file
    Evaluate {
        /// Evaluation suite (*.eval.yaml)
        suite: PathBuf,

        /// Assembly to evaluate (default: the suite's pal_file)
        #[arg(long)]
        pal_file: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArgs,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        format: ReportFormat,

        /// Write the report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
