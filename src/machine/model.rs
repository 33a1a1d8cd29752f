use std::collections::HashMap;

use crate::constant::*;
use crate::model::{CommandSpec, OptionTail};

pub(crate) type NodeId = usize;

/// The atomic unit consumed by the matcher.
///
/// Classification of a raw argv string is context-free until a branch observes
/// `--` or activates a proxy capture, after which every subsequent string is
/// forced to `Positional`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    StartOfInput,
    EndOfInput,
    Positional(String),
    Option(String),
    OptionWithValue(String, String),
    Separator,
}

impl Token {
    pub(crate) fn classify(raw: &str, state: &RunState) -> Token {
        if state.ignore_options || state.proxying {
            return Token::Positional(raw.to_string());
        }

        if raw == END_OF_OPTIONS {
            return Token::Separator;
        }

        if is_option_like(raw) {
            if let Some((name, value)) = raw.split_once('=') {
                if is_option_like(name) {
                    return Token::OptionWithValue(name.to_string(), value.to_string());
                }
            } else {
                return Token::Option(raw.to_string());
            }
        }

        Token::Positional(raw.to_string())
    }
}

// A lone '-' and negative numbers are not option-like; they match as positionals.
fn is_option_like(raw: &str) -> bool {
    let body = match raw.strip_prefix("--") {
        Some(body) => body,
        None => match raw.strip_prefix('-') {
            Some(body) => body,
            None => return false,
        },
    };

    match body.chars().next() {
        Some(first) => first.is_ascii_alphabetic(),
        None => false,
    }
}

/// The selection carried by a terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    /// The command at this registration index accepts the input.
    Command(usize),
    /// The help pseudo-command accepts the input, on behalf of this command.
    Help(usize),
}

impl Selection {
    pub(crate) fn command(&self) -> usize {
        match self {
            Selection::Command(index) | Selection::Help(index) => *index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PositionalValue {
    pub(crate) extra: bool,
    pub(crate) value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OptionPayload {
    Flag(bool),
    Value(String),
    /// An arity-1 option waiting on its value token.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionValue {
    pub(crate) name: String,
    pub(crate) value: OptionPayload,
}

/// The partial binding accumulated along one branch of the frontier.
///
/// `ignore_options`, `proxying` and `selected` are monotonic: no reducer ever
/// reverts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunState {
    pub(crate) path: Vec<String>,
    pub(crate) positionals: Vec<PositionalValue>,
    pub(crate) options: Vec<OptionValue>,
    pub(crate) ignore_options: bool,
    pub(crate) proxying: bool,
    pub(crate) help: bool,
    pub(crate) selected: Option<Selection>,
}

impl RunState {
    pub(crate) fn initial() -> Self {
        Self {
            path: Vec::default(),
            positionals: Vec::default(),
            options: Vec::default(),
            ignore_options: false,
            proxying: false,
            help: false,
            selected: None,
        }
    }

    pub(crate) fn extra_count(&self) -> usize {
        self.positionals.iter().filter(|p| p.extra).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tester {
    StartOfInput,
    EndOfInput,
    /// A positional token equal to this literal path word.
    Word(String),
    /// Any positional token.
    Positional,
    /// Any token but the input sentinels; used by help and proxy swallows.
    Always,
    /// The standalone `--` separator.
    OptionsSeparator,
    /// `-h` or `--help`.
    Help,
    /// An option token fully settled by the command's option set (flags,
    /// inline values).
    SettledOption(usize),
    /// An option token whose arity-1 tail awaits the next token.
    AwaitingOption(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reducer {
    Identity,
    PushPath,
    PushPositional,
    PushExtra,
    /// Push the raw token into the rest accumulator and lock the branch into
    /// proxy capture.
    PushProxied,
    PushOption(usize),
    SetPendingValue,
    InhibitOptions,
    UseHelp,
    Select(Selection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) tester: Tester,
    pub(crate) target: NodeId,
    pub(crate) reducer: Reducer,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) label: String,
    /// The command chain this node belongs to; `None` for the shared initial node.
    pub(crate) command: Option<usize>,
    pub(crate) transitions: Vec<Transition>,
}

impl Node {
    pub(crate) fn new(label: impl Into<String>, command: Option<usize>) -> Self {
        Self {
            label: label.into(),
            command,
            transitions: Vec::default(),
        }
    }
}

/// The compiled union of every registered command grammar.
/// Produced once per command set and immutable thereafter.
#[derive(Debug, Clone)]
pub(crate) struct Machine {
    pub(crate) nodes: Vec<Node>,
    pub(crate) terminals: HashMap<NodeId, Selection>,
    pub(crate) specs: Vec<CommandSpec>,
}

impl Machine {
    pub(crate) fn test(&self, tester: &Tester, token: &Token) -> bool {
        match tester {
            Tester::StartOfInput => matches!(token, Token::StartOfInput),
            Tester::EndOfInput => matches!(token, Token::EndOfInput),
            Tester::Word(word) => matches!(token, Token::Positional(value) if value == word),
            Tester::Positional => matches!(token, Token::Positional(_)),
            Tester::Always => !matches!(token, Token::StartOfInput | Token::EndOfInput),
            Tester::OptionsSeparator => matches!(token, Token::Separator),
            Tester::Help => {
                matches!(token, Token::Option(name) if name == HELP_SHORT || name == HELP_LONG)
            }
            Tester::SettledOption(command) => match self.specs[*command].resolve_option(token) {
                Some(matched) => !matches!(matched.tail, Some(OptionTail::Awaiting { .. })),
                None => false,
            },
            Tester::AwaitingOption(command) => match self.specs[*command].resolve_option(token) {
                Some(matched) => matches!(matched.tail, Some(OptionTail::Awaiting { .. })),
                None => false,
            },
        }
    }

    pub(crate) fn reduce(
        &self,
        reducer: &Reducer,
        mut state: RunState,
        token: &Token,
        raw: &str,
    ) -> RunState {
        match reducer {
            Reducer::Identity => {}
            Reducer::PushPath => match token {
                Token::Positional(word) => state.path.push(word.clone()),
                _ => unreachable!("internal error - path words must be positional tokens"),
            },
            Reducer::PushPositional => match token {
                Token::Positional(value) => state.positionals.push(PositionalValue {
                    extra: false,
                    value: value.clone(),
                }),
                _ => unreachable!("internal error - positional reduction on a non-positional"),
            },
            Reducer::PushExtra => state.positionals.push(PositionalValue {
                extra: true,
                value: raw.to_string(),
            }),
            Reducer::PushProxied => {
                state.proxying = true;
                state.positionals.push(PositionalValue {
                    extra: true,
                    value: raw.to_string(),
                });
            }
            Reducer::PushOption(command) => {
                let matched = self.specs[*command]
                    .resolve_option(token)
                    .expect("internal error - reduced option must resolve");

                for (name, value) in matched.flags {
                    state.options.push(OptionValue {
                        name,
                        value: OptionPayload::Flag(value),
                    });
                }

                match matched.tail {
                    Some(OptionTail::Inline { name, value }) => state.options.push(OptionValue {
                        name,
                        value: OptionPayload::Value(value),
                    }),
                    Some(OptionTail::Awaiting { name }) => state.options.push(OptionValue {
                        name,
                        value: OptionPayload::Pending,
                    }),
                    None => {}
                }
            }
            Reducer::SetPendingValue => {
                let pending = state
                    .options
                    .last_mut()
                    .expect("internal error - no option awaits a value");
                match pending.value {
                    OptionPayload::Pending => {
                        pending.value = OptionPayload::Value(raw.to_string());
                    }
                    _ => unreachable!("internal error - the last option must be pending"),
                }
            }
            Reducer::InhibitOptions => state.ignore_options = true,
            Reducer::UseHelp => state.help = true,
            Reducer::Select(selection) => {
                if state.selected.replace(*selection).is_some() {
                    unreachable!("internal error - a branch cannot select twice");
                }
            }
        }

        state
    }
}
