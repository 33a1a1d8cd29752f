use std::fmt;

use thiserror::Error;

use crate::api::{AsAny, Command, Context, Registration};
use crate::dispatch::interface::{ConsoleInterface, ErrorContext, UserInterface};
use crate::machine::{self, Machine, MatchFailure, Selection};
use crate::model::Arity;

/// The error raised when no command accepts the input.
///
/// The message names the token at the deepest divergence point; the error also
/// carries the literal tokens that would have been legal there, and the usage
/// of the closest matching command(s).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Parse error: {message}")]
pub struct ParseError {
    message: String,
    token_index: usize,
    expected: Vec<String>,
    candidates: Vec<String>,
}

impl ParseError {
    /// The literal tokens that would have been legal at the divergence point.
    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// The usage of the command(s) still alive at the divergence point.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub(crate) fn token_index(&self) -> usize {
        self.token_index
    }
}

/// The outcome of processing an input: a bound command, or the help
/// pseudo-command with the otherwise-selected command attached.
pub enum Resolution<U: 'static = ()> {
    /// The command at `index` accepted the input and has been bound.
    Command {
        /// The winning command's registration index.
        index: usize,
        /// The freshly constructed, bound command.
        command: Box<dyn Command<U>>,
    },
    /// The input requested help.
    Help {
        /// The registration index of the command help was requested for.
        command: Option<usize>,
    },
}

impl<U: 'static> Resolution<U> {
    /// View the bound command as its concrete type.
    /// `None` for the help pseudo-command or a type mismatch.
    pub fn downcast_ref<C: 'static>(&self) -> Option<&C> {
        match self {
            Resolution::Command { command, .. } => command.as_ref().as_any().downcast_ref(),
            Resolution::Help { .. } => None,
        }
    }
}

impl<U: 'static> fmt::Debug for Resolution<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Command { index, .. } => {
                write!(f, "Resolution::Command{{index: {index}, ..}}")
            }
            Resolution::Help { command } => write!(f, "Resolution::Help{{command: {command:?}}}"),
        }
    }
}

/// The frozen command set: matches inputs, binds and runs commands, and
/// enumerates completions.
/// Built via [`Cli::build`](crate::Cli::build).
///
/// A dispatcher is immutable; concurrent runs each own their private matching
/// state and command instance.
pub struct Dispatcher<U: 'static = ()> {
    program: String,
    machine: Machine,
    registrations: Vec<Registration<U>>,
    interface: Box<dyn UserInterface>,
}

impl<U: 'static> fmt::Debug for Dispatcher<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatcher{{program: {:?}, ..}}", self.program)
    }
}

impl<U: 'static> Dispatcher<U> {
    pub(crate) fn assemble(
        program: String,
        machine: Machine,
        registrations: Vec<Registration<U>>,
    ) -> Self {
        Self {
            program,
            machine,
            registrations,
            interface: Box::new(ConsoleInterface::default()),
        }
    }

    /// Replace the output seam through which usage and errors are reported.
    pub fn with_interface(mut self, interface: Box<dyn UserInterface>) -> Self {
        self.interface = interface;
        self
    }

    /// Match the input and bind the winning command.
    ///
    /// The returned command has every registered setter applied; it has not
    /// been checked or executed.
    pub fn process(&self, args: &[&str]) -> Result<Resolution<U>, ParseError> {
        let terminals =
            machine::run(&self.machine, args).map_err(|failure| self.explain(failure))?;
        let winner = machine::select(terminals)
            .expect("internal error - a survived match must produce a winner");

        match winner.selected {
            Some(Selection::Help(command)) => Ok(Resolution::Help {
                command: Some(command),
            }),
            Some(Selection::Command(command)) => Ok(Resolution::Command {
                index: command,
                command: (self.registrations[command].construct)(&winner),
            }),
            None => unreachable!("internal error - terminal branch without a selection"),
        }
    }

    /// Process the input, then check and execute the winning command against
    /// the context, reporting through the configured interface.
    ///
    /// Returns the process exit code: the command's own code on success, `0`
    /// for help, `1` for parse/validation failures and uncaught execution
    /// errors.
    pub fn run(&self, args: &[&str], mut context: Context<U>) -> i32 {
        if args.is_empty() && !self.has_default_command() {
            for line in self.usage() {
                self.interface.print(line);
            }
            return 0;
        }

        match self.process(args) {
            Err(error) => {
                let token_index = error.token_index();
                let candidates = error.candidates.clone();
                self.interface.print_error(error.to_string());
                self.interface
                    .print_error_context(ErrorContext::new(token_index, args));

                for candidate in candidates {
                    self.interface.print(candidate);
                }

                1
            }
            Ok(Resolution::Help { command }) => {
                match command {
                    Some(index) => {
                        for line in self.usage_of(index) {
                            self.interface.print(line);
                        }

                        if let Some(about) = &self.registrations[index].about {
                            self.interface.print(about.clone());
                        }
                    }
                    None => {
                        for line in self.usage() {
                            self.interface.print(line);
                        }
                    }
                }

                0
            }
            Ok(Resolution::Command { index, mut command }) => {
                if let Err(error) = command.check() {
                    self.interface.print_error(error.to_string());

                    // A validation rejection is a usage problem; show it.
                    for line in self.usage_of(index) {
                        self.interface.print(line);
                    }

                    return 1;
                }

                match command.execute(&mut context) {
                    Ok(code) => code,
                    Err(error) => match command.catch(error) {
                        Ok(code) => code,
                        Err(error) => {
                            self.interface.print_error(error.to_string());
                            1
                        }
                    },
                }
            }
        }
    }

    /// Enumerate the literal tokens that could legally extend the input.
    ///
    /// With `partial`, the final token is treated as a prefix to complete;
    /// otherwise the suggestions follow the full input.
    /// Sorted case-insensitively (upper case first on ties), deduplicated.
    pub fn suggest(&self, args: &[&str], partial: bool) -> Vec<String> {
        machine::suggest(&self.machine, args, partial)
    }

    /// One usage line per registered command path.
    pub fn usage(&self) -> Vec<String> {
        let mut out = Vec::default();

        for registration in &self.registrations {
            for path in &registration.spec.paths {
                out.push(self.usage_line(registration.spec.index, path));
            }
        }

        out
    }

    fn usage_of(&self, index: usize) -> Vec<String> {
        self.registrations[index]
            .spec
            .paths
            .iter()
            .map(|path| self.usage_line(index, path))
            .collect()
    }

    fn usage_line(&self, index: usize, path: &[String]) -> String {
        let spec = &self.registrations[index].spec;
        let mut parts: Vec<String> = vec![self.program.clone()];
        parts.extend(path.iter().cloned());
        parts.push("[-h]".to_string());

        for option in &spec.options {
            if option.hidden() {
                continue;
            }

            let name = option
                .names()
                .first()
                .expect("internal error - an option carries at least one name");

            match option.arity() {
                Arity::Zero => parts.push(format!("[{name}]")),
                Arity::One => parts.push(format!("[{name} <value>]")),
            }
        }

        for positional in &spec.positionals {
            if positional.required() {
                parts.push(format!("<{}>", positional.name()));
            } else {
                parts.push(format!("[<{}>]", positional.name()));
            }
        }

        if let Some(rest) = &spec.rest {
            if rest.required() > 0 {
                parts.push(format!("<{} ...>", rest.name()));
            } else {
                parts.push(format!("[{} ...]", rest.name()));
            }
        }

        format!("usage: {}", parts.join(" "))
    }

    fn has_default_command(&self) -> bool {
        self.registrations
            .iter()
            .any(|registration| registration.spec.is_default())
    }

    fn explain(&self, failure: MatchFailure) -> ParseError {
        let mut message = match &failure.token {
            Some(token) => format!("Could not match the token '{token}'."),
            None => "Not enough tokens provided.".to_string(),
        };

        if !failure.expected.is_empty() {
            message.push_str(&format!(
                " Expected one of: {}.",
                failure.expected.join(", ")
            ));
        }

        let candidates = failure
            .candidates
            .iter()
            .flat_map(|index| self.usage_of(*index))
            .collect();

        ParseError {
            message,
            token_index: failure.token_index,
            expected: failure.expected,
            candidates,
        }
    }
}
