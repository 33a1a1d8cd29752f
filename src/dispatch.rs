mod interface;
mod middleware;

pub use interface::{ConsoleInterface, ErrorContext, UserInterface};
pub use middleware::{Dispatcher, ParseError, Resolution};

#[cfg(feature = "unit_test")]
pub use interface::RecordingInterface;
#[cfg(all(test, not(feature = "unit_test")))]
pub(crate) use interface::RecordingInterface;
