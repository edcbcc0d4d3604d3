//! CLI command handlers
//!
//! This module contains all CLI-related functionality including:
//! - Argument parsing structures
//! - Command implementations
//! - Shared services built from the loaded settings

pub mod args;
pub mod commands;
pub mod router;
pub mod services;

#[cfg(test)]
mod tests;

// Re-export the main CLI structures for convenience
pub use args::{Cli, Commands};
pub use router::execute_command;
pub use services::Services;
