//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::{describe_error_code, LabflowError};

/// Report a fatal error and exit with the matching status code.
///
/// `LabflowError`s print their user message and exit with their category's
/// code; with `-v` the full source chain follows. Anything else exits with 1.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {:#}", error);

    let exit_code = if let Some(labflow_err) = error.downcast_ref::<LabflowError>() {
        eprintln!("Error: {}", labflow_err.user_message());
        let code = labflow_err.code();
        eprintln!("  [E{:04}] {}", code, describe_error_code(code));
        labflow_err.exit_code()
    } else {
        eprintln!("Error: {error}");
        1
    };

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code)
}
