use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Command, Flag};

/// Anything that can be rendered into argv tokens.
pub trait ToArgs {
    fn to_args(&self) -> Vec<String>;
}

impl ToArgs for str {
    fn to_args(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl ToArgs for &str {
    fn to_args(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl ToArgs for String {
    fn to_args(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl ToArgs for Path {
    fn to_args(&self) -> Vec<String> {
        vec![self.to_string_lossy().into_owned()]
    }
}

impl ToArgs for PathBuf {
    fn to_args(&self) -> Vec<String> {
        self.as_path().to_args()
    }
}

impl<T: ToArgs> ToArgs for Vec<T> {
    fn to_args(&self) -> Vec<String> {
        self.iter().flat_map(ToArgs::to_args).collect()
    }
}

impl ToArgs for Flag {
    fn to_args(&self) -> Vec<String> {
        self.to_command()
    }
}

impl ToArgs for Command {
    fn to_args(&self) -> Vec<String> {
        self.to_command()
    }
}

/// Positional arguments computed when the command is rendered.
#[derive(Clone)]
pub struct DeferredArgs(Arc<dyn Fn() -> Vec<String> + Send + Sync>);

impl DeferredArgs {
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        Self(Arc::new(compute))
    }
}

impl ToArgs for DeferredArgs {
    fn to_args(&self) -> Vec<String> {
        (self.0)()
    }
}

impl fmt::Debug for DeferredArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeferredArgs(..)")
    }
}
