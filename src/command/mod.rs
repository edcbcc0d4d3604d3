//! Composable external commands.
//!
//! A [`Command`] is a base invocation (`mamba install`), a set of named
//! [`Flag`]s that merge when registered twice, and positional arguments. It
//! renders to an argument vector; nothing here ever goes through a shell.

pub mod args;
pub mod flag;
pub mod value;

#[cfg(test)]
mod tests;

pub use args::{DeferredArgs, ToArgs};
pub use flag::{Flag, DEFAULT_SEPARATOR};
pub use value::{DeferredValue, FlagValue};

use crate::error::{ErrorCode, LabflowError, Result};
use crate::subprocess::ProcessCommandBuilder;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Command {
    base: Vec<String>,
    /// Unique per name, kept in first-registration order.
    flags: Vec<Flag>,
    positional: Vec<Arc<dyn ToArgs + Send + Sync>>,
}

impl Command {
    pub fn new<I, S>(base: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base: base.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append tokens to the base invocation.
    pub fn call<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Register a flag, merging it into an existing flag of the same name.
    pub fn with_flag(self, name: &str, value: impl Into<FlagValue>) -> Result<Self> {
        Ok(self.add_flag(Flag::new(name, value)?))
    }

    /// Register a fully configured flag (separators, repeatable).
    pub fn add_flag(mut self, flag: Flag) -> Self {
        match self.flags.iter_mut().find(|f| f.name() == flag.name()) {
            Some(existing) => existing.merge(flag),
            None => self.flags.push(flag),
        }
        self
    }

    pub fn with_positional_arguments<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: ToArgs + Send + Sync + 'static,
    {
        for arg in args {
            self.positional.push(Arc::new(arg));
        }
        self
    }

    pub fn with_positional_argument<A>(self, arg: A) -> Self
    where
        A: ToArgs + Send + Sync + 'static,
    {
        self.with_positional_arguments(std::iter::once(arg))
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name() == name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    pub fn remove_flag(&mut self, name: &str) -> Option<Flag> {
        let index = self.flags.iter().position(|f| f.name() == name)?;
        Some(self.flags.remove(index))
    }

    pub fn base(&self) -> &[String] {
        &self.base
    }

    /// Render to an argument vector: base, then flags, then positional
    /// arguments. Empty positional tokens are dropped.
    pub fn to_command(&self) -> Vec<String> {
        let mut tokens = self.base.clone();
        tokens.extend(self.flags.iter().flat_map(Flag::to_command));
        tokens.extend(
            self.positional
                .iter()
                .flat_map(|arg| arg.to_args())
                .filter(|token| !token.is_empty()),
        );
        tokens
    }

    /// The rendered command as a shell-quoted line, for logs and error messages.
    pub fn command_line(&self) -> String {
        shell_words::join(self.to_command())
    }

    /// Split the rendered command into program and arguments.
    pub fn to_process(&self) -> Result<ProcessCommandBuilder> {
        let mut tokens = self.to_command().into_iter();
        let program = tokens.next().ok_or_else(|| {
            LabflowError::command_with_code(ErrorCode::COMMAND_EMPTY, "Command renders to no tokens")
        })?;
        Ok(ProcessCommandBuilder::new(&program).args(tokens))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("base", &self.base)
            .field("flags", &self.flags)
            .field("positional", &self.positional.len())
            .finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}
