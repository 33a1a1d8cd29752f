mod bind;
mod command;
mod core;

pub use self::core::{Cli, CommandBuilder, ConfigError};
pub use command::{AsAny, Command, Context, ExecutionError, ValidationError};
pub(crate) use bind::MatchedArgs;
pub(crate) use self::core::Registration;
