use std::fmt;

/// Marks where in the input an error occurred: the tokens as received, with a
/// caret line pointing at the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    token_index: usize,
    tokens: Vec<String>,
}

impl ErrorContext {
    /// Create an error context pointing at `token_index` within `tokens`.
    /// An index one past the end marks a truncated input.
    pub fn new(token_index: usize, tokens: &[&str]) -> Self {
        Self {
            token_index,
            tokens: tokens.iter().map(|token| token.to_string()).collect(),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;

        for token in self.tokens.iter().take(self.token_index) {
            offset += token.len() + 1;
        }

        writeln!(f, "{}", self.tokens.join(" "))?;
        write!(f, "{:offset$}^", "")
    }
}

/// The output seam between the dispatcher and its host.
///
/// The default implementation writes to the process streams; swap it out to
/// capture the dispatcher's messages elsewhere.
pub trait UserInterface {
    /// Emit an informational message (usage, help).
    fn print(&self, message: String);

    /// Emit an error message.
    fn print_error(&self, error: String);

    /// Emit the input context for an error.
    fn print_error_context(&self, error_context: ErrorContext);
}

/// A [`UserInterface`] over the process stdout/stderr.
#[derive(Default)]
pub struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, error: String) {
        eprintln!("{error}");
    }

    fn print_error_context(&self, error_context: ErrorContext) {
        eprintln!("{error_context}");
    }
}

#[cfg(any(test, feature = "unit_test"))]
mod recording {
    use super::{ErrorContext, UserInterface};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Recorded {
        lines: Vec<String>,
        error: Option<String>,
        error_context: Option<ErrorContext>,
    }

    /// A [`UserInterface`] that records everything it is told, for tests.
    ///
    /// Clones share one recording, so a test can hand the dispatcher a clone
    /// and inspect the original after the run.
    #[derive(Clone, Default)]
    pub struct RecordingInterface {
        recorded: Rc<RefCell<Recorded>>,
    }

    impl UserInterface for RecordingInterface {
        fn print(&self, message: String) {
            self.recorded.borrow_mut().lines.push(message);
        }

        fn print_error(&self, error: String) {
            // The dispatcher reports at most one error per run.
            let displaced = self.recorded.borrow_mut().error.replace(error);
            assert_eq!(displaced, None, "a second error was reported");
        }

        fn print_error_context(&self, error_context: ErrorContext) {
            let displaced = self
                .recorded
                .borrow_mut()
                .error_context
                .replace(error_context);
            assert_eq!(displaced, None, "a second error context was reported");
        }
    }

    impl RecordingInterface {
        /// Every printed line so far, newline-joined.
        pub fn printed(&self) -> String {
            self.recorded.borrow().lines.join("\n")
        }

        /// The reported error, if any.
        pub fn error(&self) -> Option<String> {
            self.recorded.borrow().error.clone()
        }

        /// The reported error context, if any.
        pub fn error_context(&self) -> Option<ErrorContext> {
            self.recorded.borrow().error_context.clone()
        }
    }
}

#[cfg(any(test, feature = "unit_test"))]
pub use recording::RecordingInterface;
