//! Command routing and execution
//!
//! This module handles routing CLI commands to their respective implementations.

use anyhow::Result;

use crate::cli::args::Commands;
use crate::cli::commands::{run_config_command, run_env_command, run_workflow_command};
use crate::cli::services::Services;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, services: &Services) -> Result<()> {
    match command {
        Commands::Env { command } => run_env_command(command, services).await,
        Commands::Workflow { command } => run_workflow_command(command, services).await,
        Commands::Config => run_config_command(services),
    }
}
