//! Command implementations

pub mod config;
pub mod env;
pub mod workflow;

pub use config::run_config_command;
pub use env::run_env_command;
pub use workflow::run_workflow_command;
