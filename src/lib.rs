//! # labflow
//!
//! Runs bioinformatics tools inside managed conda/mamba environments and
//! prepares workflow directories: pulls a workflow definition, stages the
//! dataset files it needs and writes its configuration files.
//!
//! ## Usage
//!
//! ```bash
//! labflow env run align -- samtools --version
//! labflow workflow run manifest.yml -d runs/pilot -p params.yml --catalog catalog.yml
//! ```
//!
//! ## Modules
//!
//! - `command` - Command lines built from a base, flags and positional arguments
//! - `subprocess` - Process execution behind a mockable runner
//! - `environment` - Named software environments and commands run inside them
//! - `source` - Where workflow definitions come from (git, local templates)
//! - `data` - Dataset selection, path resolution and file staging
//! - `metadata` - Sample by variable metadata tables
//! - `generator` - Configuration files written into a workflow directory
//! - `workflow` - Workflow descriptors, manifests and the runner
//! - `config` - Layered settings (files and environment variables)
//! - `error` - Error types with stable codes
pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod data;
pub mod environment;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod source;
pub mod subprocess;
pub mod workflow;

pub use error::{LabflowError, Result};
