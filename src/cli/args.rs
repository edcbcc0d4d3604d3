//! CLI argument structures
//!
//! This module defines all command-line interface structures used by labflow.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Stage data and run bioinformatics workflows in managed environments
#[derive(Parser)]
#[command(name = "labflow")]
#[command(about = "labflow - stage data and run bioinformatics workflows in managed environments", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file to use instead of ./labflow.yml
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage software environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Prepare and run workflows
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },
    /// Print the effective settings
    Config,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List environments
    List {
        /// Print a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Create an environment (no-op if it exists)
    Create { name: String },
    /// Remove an environment
    Remove { name: String },
    /// List the packages installed in an environment
    Packages {
        name: String,
        /// Print the package list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Install packages into an environment
    Install {
        name: String,
        #[arg(required = true)]
        packages: Vec<String>,
        /// Extra channel, may be repeated
        #[arg(short = 'C', long = "channel", value_name = "CHANNEL")]
        channels: Vec<String>,
    },
    /// Run a command inside an environment
    Run {
        name: String,
        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Ask the manager to pass output through as it is produced
        #[arg(long)]
        live: bool,
        /// Give up after this many seconds (0 waits indefinitely)
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
        /// The command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Pull a workflow, stage its data and write its config files
    Prepare(WorkflowArgs),
    /// Prepare a workflow and run it in its environment
    Run {
        #[command(flatten)]
        workflow: WorkflowArgs,
        /// Append workflow output to this file instead of the terminal
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WorkflowArgs {
    /// Workflow manifest (YAML)
    pub manifest: PathBuf,

    /// Directory to prepare the workflow in
    #[arg(short = 'd', long)]
    pub directory: PathBuf,

    /// Analysis parameters (YAML or JSON)
    #[arg(short = 'p', long)]
    pub params: Option<PathBuf>,

    /// Dataset catalog (YAML or JSON)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Sample metadata table (CSV, or TSV for .tsv/.txt)
    #[arg(short = 'm', long)]
    pub metadata: Option<PathBuf>,
}
