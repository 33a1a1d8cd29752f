use std::any::Any;
use std::io::{Read, Write};

use thiserror::Error;

/// The error raised when a command's [`Command::check`] hook rejects the bound
/// values. The dispatcher prints the command's usage alongside it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Validation error: {0}")]
pub struct ValidationError(pub String);

/// The error raised by [`Command::execute`] and not handled by the command's
/// own [`Command::catch`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ExecutionError(pub String);

impl ExecutionError {
    /// Create an execution error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(error: std::io::Error) -> Self {
        Self(error.to_string())
    }
}

/// The per-run payload handed to an executing command: stream handles, the
/// colour depth, and a caller-defined extension carried verbatim.
pub struct Context<U = ()> {
    /// The input stream.
    pub stdin: Box<dyn Read>,
    /// The output stream.
    pub stdout: Box<dyn Write>,
    /// The error stream.
    pub stderr: Box<dyn Write>,
    /// The colour depth of the output stream, at least 1 (1 meaning no colour).
    pub color_depth: u8,
    /// The caller-defined extension.
    pub extra: U,
}

impl<U> Context<U> {
    /// Create a context around the process streams, carrying `extra`.
    pub fn new(extra: U) -> Self {
        Self {
            stdin: Box::new(std::io::stdin()),
            stdout: Box::new(std::io::stdout()),
            stderr: Box::new(std::io::stderr()),
            color_depth: 1,
            extra,
        }
    }
}

impl<U: Default> Default for Context<U> {
    fn default() -> Self {
        Self::new(U::default())
    }
}

/// Behaviour to upcast a command to [`Any`], so that a dispatched command can
/// be inspected by its concrete type.
/// Implemented for every `'static` type.
pub trait AsAny {
    /// Upcast a shared reference.
    fn as_any(&self) -> &dyn Any;

    /// Upcast an exclusive reference.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A dispatchable command.
///
/// The struct's fields are filled by the setters registered on its
/// [`CommandBuilder`](crate::CommandBuilder) before any hook runs.
pub trait Command<U = ()>: AsAny {
    /// Validate the bound values before execution.
    ///
    /// This is the seam for domain validation; the matcher itself never
    /// inspects values. A rejection surfaces with exit code 1 and the
    /// command's usage.
    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Run the command.
    /// The returned code becomes the process exit code.
    fn execute(&mut self, context: &mut Context<U>) -> Result<i32, ExecutionError>;

    /// Intercept an error raised by [`Command::execute`].
    ///
    /// Returning `Ok` recovers with an exit code; re-raising (the default) is
    /// terminal.
    fn catch(&mut self, error: ExecutionError) -> Result<i32, ExecutionError> {
        Err(error)
    }
}
