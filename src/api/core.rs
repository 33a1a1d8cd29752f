use std::collections::HashSet;

use thiserror::Error;

use crate::api::bind::{MatchedArgs, Transform};
use crate::api::command::Command;
use crate::constant::*;
use crate::dispatch::Dispatcher;
use crate::machine::{compile, RunState};
use crate::model::{Arity, CommandSpec, OptionSpec, PositionalSpec, RestSpec};

/// The error raised when a command set is mis-declared (ex: a repeated option
/// name). Raised by [`Cli::build`], never during matching.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Config error: {0}")]
pub struct ConfigError(pub(crate) String);

/// The grammar and field setters of a single command.
///
/// A builder accumulates the command's subcommand path(s), options, positional
/// slots, and trailing capture, each paired with a setter that copies the
/// matched value onto the command struct.
/// Setters run in declaration order once the command wins the match.
///
/// ### Example
/// ```
/// use switchyard::{Command, CommandBuilder, Context, ExecutionError};
///
/// #[derive(Default)]
/// struct Remove {
///     force: bool,
///     targets: Vec<String>,
/// }
///
/// impl Command for Remove {
///     fn execute(&mut self, _context: &mut Context) -> Result<i32, ExecutionError> {
///         Ok(0)
///     }
/// }
///
/// let builder = CommandBuilder::<Remove>::new()
///     .path(&["remove"])
///     .flag(&["-f", "--force"], |command, value| command.force = value)
///     .rest("targets", 1, |command, values| command.targets = values);
/// ```
pub struct CommandBuilder<C> {
    paths: Vec<Vec<String>>,
    options: Vec<OptionSpec>,
    positionals: Vec<PositionalSpec>,
    rest: Option<RestSpec>,
    proxy: bool,
    about: Option<String>,
    transforms: Vec<Transform<C>>,
    defects: Vec<String>,
}

impl<C: 'static> Default for CommandBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> CommandBuilder<C> {
    /// Create an empty command declaration.
    /// Without a [`CommandBuilder::path`], this declares the *default* command.
    pub fn new() -> Self {
        Self {
            paths: Vec::default(),
            options: Vec::default(),
            positionals: Vec::default(),
            rest: None,
            proxy: false,
            about: None,
            transforms: Vec::default(),
            defects: Vec::default(),
        }
    }

    /// Add a subcommand path: the literal words identifying this command.
    /// May be repeated to register aliases; each path matches independently.
    pub fn path(mut self, words: &[&str]) -> Self {
        self.paths
            .push(words.iter().map(|word| word.to_string()).collect());
        self
    }

    /// Capture the matched path words onto the command.
    /// Useful when one command answers to several paths.
    pub fn capture_path(mut self, set: impl Fn(&mut C, Vec<String>) + 'static) -> Self {
        self.transforms.push(Box::new(move |command, matched| {
            set(command, matched.path().to_vec());
        }));
        self
    }

    /// Document the about message for this command.
    /// If repeated, only the final message will apply.
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.about.replace(description.into());
        self
    }

    /// Add an arity-0 option.
    ///
    /// The setter receives `true` per plain occurrence and `false` per
    /// `--no-` negated occurrence; the last occurrence wins.
    /// Unmentioned on the command line, the setter does not run.
    pub fn flag(mut self, names: &[&str], set: impl Fn(&mut C, bool) + 'static) -> Self {
        let names = self.declare_option(names, Arity::Zero);
        self.transforms.push(Box::new(move |command, matched| {
            if let Some(value) = matched.flag(&names) {
                set(command, value);
            }
        }));
        self
    }

    /// Add an arity-1 option whose last occurrence wins.
    pub fn value(mut self, names: &[&str], set: impl Fn(&mut C, String) + 'static) -> Self {
        let names = self.declare_option(names, Arity::One);
        self.transforms.push(Box::new(move |command, matched| {
            if let Some(value) = matched.value(&names) {
                set(command, value);
            }
        }));
        self
    }

    /// Add an arity-1 option collecting every occurrence, in order.
    /// The setter runs only when the option occurs at least once.
    pub fn values(mut self, names: &[&str], set: impl Fn(&mut C, Vec<String>) + 'static) -> Self {
        let names = self.declare_option(names, Arity::One);
        self.transforms.push(Box::new(move |command, matched| {
            let values = matched.values(&names);
            if !values.is_empty() {
                set(command, values);
            }
        }));
        self
    }

    /// Hide the most recently added option from suggestions and usage.
    /// Hidden options still match.
    pub fn hidden(mut self) -> Self {
        match self.options.last_mut() {
            Some(option) => option.hide(),
            None => self
                .defects
                .push("Cannot hide an option before adding one.".to_string()),
        }
        self
    }

    /// Add a required positional slot.
    pub fn positional(mut self, name: &str, set: impl Fn(&mut C, String) + 'static) -> Self {
        self.declare_positional(name, true);
        self.transforms.push(Box::new(move |command, matched| {
            let value = matched
                .next_positional()
                .expect("internal error - a required positional must be filled");
            set(command, value);
        }));
        self
    }

    /// Add an optional positional slot.
    /// The setter always runs, with `None` when the slot went unfilled.
    pub fn optional_positional(
        mut self,
        name: &str,
        set: impl Fn(&mut C, Option<String>) + 'static,
    ) -> Self {
        self.declare_positional(name, false);
        self.transforms.push(Box::new(move |command, matched| {
            set(command, matched.next_positional());
        }));
        self
    }

    /// Add the trailing rest capture, collecting `required` or more
    /// positionals into a list.
    pub fn rest(
        mut self,
        name: &str,
        required: usize,
        set: impl Fn(&mut C, Vec<String>) + 'static,
    ) -> Self {
        self.declare_trailing(name, required);
        self.transforms.push(Box::new(move |command, matched| {
            set(command, matched.remaining());
        }));
        self
    }

    /// Add the trailing proxy capture: once reached, *every* remaining token
    /// is collected verbatim, option-shaped or not.
    pub fn proxy(mut self, name: &str, set: impl Fn(&mut C, Vec<String>) + 'static) -> Self {
        self.declare_trailing(name, 0);
        self.proxy = true;
        self.transforms.push(Box::new(move |command, matched| {
            set(command, matched.remaining());
        }));
        self
    }

    fn declare_option(&mut self, names: &[&str], arity: Arity) -> Vec<String> {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        self.options.push(OptionSpec::new(names.clone(), arity));
        names
    }

    fn declare_positional(&mut self, name: &str, required: bool) {
        if self.rest.is_some() {
            self.defects.push(format!(
                "Cannot add the positional parameter '{name}' after the trailing capture."
            ));
        }

        // An optional slot fills before any later slot can; a required
        // parameter behind one could never honour its contract.
        if required && self.positionals.iter().any(|p| !p.required()) {
            self.defects.push(format!(
                "Cannot add the required positional parameter '{name}' after an optional one."
            ));
        }

        self.positionals.push(PositionalSpec::new(name, required));
    }

    fn declare_trailing(&mut self, name: &str, required: usize) {
        if self.rest.is_some() {
            self.defects
                .push("Cannot configure multiple trailing captures.".to_string());
        }

        self.rest.replace(RestSpec::new(name, required));
    }
}

pub(crate) struct Registration<U> {
    pub(crate) spec: CommandSpec,
    pub(crate) about: Option<String>,
    pub(crate) construct: Box<dyn Fn(&RunState) -> Box<dyn Command<U>>>,
    defects: Vec<String>,
}

/// The multi-command registration surface.
///
/// Commands are registered in priority order (earlier wins ties), then frozen
/// into an immutable [`Dispatcher`] by [`Cli::build`].
///
/// ### Example
/// ```
/// use switchyard::{Cli, Command, CommandBuilder, Context, ExecutionError};
///
/// #[derive(Default)]
/// struct Version {}
///
/// impl Command for Version {
///     fn execute(&mut self, _context: &mut Context) -> Result<i32, ExecutionError> {
///         Ok(0)
///     }
/// }
///
/// let dispatcher = Cli::new("program")
///     .register(CommandBuilder::<Version>::new().path(&["version"]))
///     .build()
///     .unwrap();
/// ```
pub struct Cli<U: 'static = ()> {
    program: String,
    registrations: Vec<Registration<U>>,
}

impl<U: 'static> Cli<U> {
    /// Create a command set for the named program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            registrations: Vec::default(),
        }
    }

    /// Register a command.
    /// The registration order doubles as the final disambiguation order.
    pub fn register<C>(mut self, builder: CommandBuilder<C>) -> Self
    where
        C: Command<U> + Default + 'static,
    {
        let CommandBuilder {
            paths,
            options,
            positionals,
            rest,
            proxy,
            about,
            transforms,
            defects,
        } = builder;

        let spec = CommandSpec {
            index: self.registrations.len(),
            paths: if paths.is_empty() {
                vec![Vec::default()]
            } else {
                paths
            },
            options,
            positionals,
            rest,
            proxy,
        };

        let construct = Box::new(move |state: &RunState| -> Box<dyn Command<U>> {
            let mut command = C::default();
            let mut matched = MatchedArgs::new(state);

            for transform in &transforms {
                transform(&mut command, &mut matched);
            }

            Box::new(command)
        });

        self.registrations.push(Registration {
            spec,
            about,
            construct,
            defects,
        });
        self
    }

    /// Build the dispatcher.
    /// This finalizes the command set and checks for declaration errors.
    pub fn build(self) -> Result<Dispatcher<U>, ConfigError> {
        for registration in &self.registrations {
            validate(registration)?;
        }

        let specs = self
            .registrations
            .iter()
            .map(|registration| registration.spec.clone())
            .collect();

        Ok(Dispatcher::assemble(
            self.program,
            compile(specs),
            self.registrations,
        ))
    }
}

fn validate<U>(registration: &Registration<U>) -> Result<(), ConfigError> {
    if let Some(defect) = registration.defects.first() {
        return Err(ConfigError(defect.clone()));
    }

    let spec = &registration.spec;
    let mut seen: HashSet<&String> = HashSet::default();

    for option in &spec.options {
        if option.names().is_empty() {
            return Err(ConfigError(
                "An option requires at least one name.".to_string(),
            ));
        }

        for name in option.names() {
            if name == HELP_SHORT || name == HELP_LONG {
                return Err(ConfigError(format!(
                    "Cannot configure the reserved option '{name}'."
                )));
            }

            if !well_formed(name) {
                return Err(ConfigError(format!("Invalid option name '{name}'.")));
            }

            if !seen.insert(name) {
                return Err(ConfigError(format!("Cannot duplicate the option '{name}'.")));
            }
        }
    }

    for path in &spec.paths {
        for word in path {
            if word.is_empty() || word.starts_with('-') {
                return Err(ConfigError(format!("Invalid path word '{word}'.")));
            }
        }
    }

    Ok(())
}

// Short names are '-' plus a single ascii letter; long names are '--' plus a
// body starting with an ascii letter. Anything else could never classify as
// an option token.
fn well_formed(name: &str) -> bool {
    match name.strip_prefix("--") {
        Some(body) => body
            .chars()
            .next()
            .map(|first| first.is_ascii_alphabetic())
            .unwrap_or(false),
        None => match name.strip_prefix('-') {
            Some(body) => {
                let mut chars = body.chars();
                matches!((chars.next(), chars.next()), (Some(single), None) if single.is_ascii_alphabetic())
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::command::{Context, ExecutionError};
    use rstest::rstest;

    #[derive(Default)]
    struct Noop {}

    impl Command for Noop {
        fn execute(&mut self, _context: &mut Context) -> Result<i32, ExecutionError> {
            Ok(0)
        }
    }

    #[test]
    fn build_empty() {
        // Execute & verify
        Cli::<()>::new("program").build().unwrap();
    }

    #[test]
    fn build_simple() {
        // Setup
        let cli = Cli::new("program").register(
            CommandBuilder::<Noop>::new()
                .path(&["go"])
                .flag(&["-f", "--force"], |_, _| {})
                .value(&["--tag"], |_, _| {}),
        );

        // Execute & verify
        cli.build().unwrap();
    }

    #[rstest]
    #[case(&["--force", "-f"], &["--force"], "Cannot duplicate the option '--force'.")]
    #[case(&["-f"], &["-f"], "Cannot duplicate the option '-f'.")]
    fn build_duplicate_option(
        #[case] first: &[&str],
        #[case] second: &[&str],
        #[case] expected: &str,
    ) {
        // Setup
        let cli = Cli::new("program").register(
            CommandBuilder::<Noop>::new()
                .flag(first, |_, _| {})
                .flag(second, |_, _| {}),
        );

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(error, ConfigError(expected.to_string()));
    }

    #[rstest]
    #[case("-h")]
    #[case("--help")]
    fn build_reserved_option(#[case] name: &str) {
        // Setup
        let cli = Cli::new("program")
            .register(CommandBuilder::<Noop>::new().flag(&[name], |_, _| {}));

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(
            error,
            ConfigError(format!("Cannot configure the reserved option '{name}'."))
        );
    }

    #[rstest]
    #[case("force")]
    #[case("-")]
    #[case("--")]
    #[case("-fx")]
    #[case("-1")]
    #[case("--1up")]
    fn build_malformed_option(#[case] name: &str) {
        // Setup
        let cli = Cli::new("program")
            .register(CommandBuilder::<Noop>::new().flag(&[name], |_, _| {}));

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(error, ConfigError(format!("Invalid option name '{name}'.")));
    }

    #[test]
    fn build_invalid_path_word() {
        // Setup
        let cli = Cli::new("program")
            .register(CommandBuilder::<Noop>::new().path(&["go", "--fast"]));

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(error, ConfigError("Invalid path word '--fast'.".to_string()));
    }

    #[test]
    fn build_positional_after_rest() {
        // Setup
        let cli = Cli::new("program").register(
            CommandBuilder::<Noop>::new()
                .rest("items", 0, |_, _| {})
                .positional("straggler", |_, _| {}),
        );

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(
            error,
            ConfigError(
                "Cannot add the positional parameter 'straggler' after the trailing capture."
                    .to_string()
            )
        );
    }

    #[test]
    fn build_required_positional_after_optional() {
        // Setup
        let cli = Cli::new("program").register(
            CommandBuilder::<Noop>::new()
                .optional_positional("maybe", |_, _| {})
                .positional("must", |_, _| {}),
        );

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(
            error,
            ConfigError(
                "Cannot add the required positional parameter 'must' after an optional one."
                    .to_string()
            )
        );
    }

    #[test]
    fn build_multiple_trailing_captures() {
        // Setup
        let cli = Cli::new("program").register(
            CommandBuilder::<Noop>::new()
                .rest("items", 0, |_, _| {})
                .proxy("args", |_, _| {}),
        );

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(
            error,
            ConfigError("Cannot configure multiple trailing captures.".to_string())
        );
    }

    #[test]
    fn build_hidden_without_option() {
        // Setup
        let cli = Cli::new("program").register(CommandBuilder::<Noop>::new().hidden());

        // Execute
        let error = cli.build().unwrap_err();

        // Verify
        assert_eq!(
            error,
            ConfigError("Cannot hide an option before adding one.".to_string())
        );
    }
}
