//! Workflow templates and their preparation.
//!
//! A [`WorkflowDescriptor`] ties together where a workflow comes from, which
//! datasets it needs, which configuration files it expects and how it is
//! started. [`WorkflowRunner`] turns a descriptor plus analysis parameters into
//! a populated directory and runs it.

mod descriptor;
mod manifest;
mod registry;
mod runner;


pub use descriptor::{DataBinding, PatchHook, WorkflowDescriptor, WorkflowDescriptorBuilder};
pub use manifest::{CommandSpec, DataSpec, ManifestBuildContext, ParameterPaths, WorkflowManifest};
pub use registry::WorkflowRegistry;
pub use runner::{PreparedWorkflow, RunReport, WorkflowRunner};
