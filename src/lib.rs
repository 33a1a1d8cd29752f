//! `switchyard` is a multi-command argument matcher and dispatcher for Rust.
//!
//! Where most command line crates parse a single command at a time, `switchyard`
//! compiles *every* registered command into one state machine and runs them all
//! against the input simultaneously.
//! Specifically, `switchyard` attempts to prioritize the following design concerns:
//! * *Simultaneous matching*:
//! All registered commands are considered in parallel; the input itself selects
//! the command, even when commands share subcommand path prefixes or compete
//! with a pathless default command.
//! * *Subcommand path paradigm*:
//! Commands are identified by ordered literal path words (ex: `remote add`),
//! any number of words deep, with ties resolved by a total priority order.
//! * *Typed command structs*:
//! Matched tokens are bound onto a freshly constructed command struct through
//! setters registered at declaration time; the user never inspects raw argv.
//! * *Completion as a first-class output*:
//! The same machine that matches the input enumerates the literal tokens that
//! could legally extend it, for shell completion.
//! * *Detailed yet basic UX*:
//! Parse errors name the offending token and propose the completions that would
//! have been legal. We do not aim to support rich display configurations; help
//! rendering beyond a usage summary is left to the caller.
//!
//! # Usage
//! Declare each command as a struct, describe its grammar with a
//! [`CommandBuilder`], and register the builders on a [`Cli`]:
//!
//! ```
//! use switchyard::{Cli, Command, CommandBuilder, Context, ExecutionError};
//!
//! #[derive(Default)]
//! struct Add {
//!     tag: Option<String>,
//!     file: String,
//! }
//!
//! impl Command for Add {
//!     fn execute(&mut self, _context: &mut Context) -> Result<i32, ExecutionError> {
//!         // .. do something with self.tag & self.file ..
//!         Ok(0)
//!     }
//! }
//!
//! let dispatcher = Cli::new("program")
//!     .register(
//!         CommandBuilder::<Add>::new()
//!             .path(&["add"])
//!             .value(&["-t", "--tag"], |command, value| command.tag = Some(value))
//!             .positional("file", |command, value| command.file = value),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let code = dispatcher.run(&["add", "--tag=v1", "file.txt"], Context::default());
//! assert_eq!(code, 0);
//! ```
//!
//! # Cli Semantics
//! `switchyard` matches the input tokens according to the following rules.
//! * Path words are matched first, in order; commands whose next path word does
//! not equal the next token drop out.
//! A command declared without a path is the *default* command and competes with
//! every other command.
//! * Options are matched anywhere after the path via `--NAME` (or short `-N`)
//! specifiers.
//! An option of arity 1 takes its value from the next token, or inline via the
//! `=` character (`--key=123`).
//! * Multiple arity-0 short options may be combined into a single flag:
//! `-abc` is equivalent to `-a -b -c`.
//! Trailing characters bind as the value of an arity-1 short: `-abcXYZ` is
//! equivalent to `-a -b -c=XYZ` when `-c` has arity 1.
//! * `--no-NAME` sets an arity-0 `--NAME` to `false`.
//! * A standalone `--` ends option processing; every later token is a
//! positional, no matter its shape.
//! * A *rest* capture collects trailing positionals; a *proxy* capture collects
//! every remaining token verbatim, option-shaped or not.
//! * `-h`/`--help` anywhere after the path selects the help pseudo-command and
//! swallows the remaining input.
//!
//! When several commands survive the full input, the winner is chosen by:
//! longest consumed path, then fewest rest-captured positionals, then earliest
//! registration.
//!
//! # Features
//! * `unit_test`: For features that help with unit testing.
//! * `debug`: Trace the matcher frontier via `tracing`.
#![deny(missing_docs)]
mod api;
mod constant;
mod dispatch;
mod machine;
mod model;

pub use api::*;
pub use dispatch::*;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
