use rand::{distributions::Standard, prelude::Distribution, Rng};

use crate::constant::*;
use crate::machine::Token;

/// Describes the number of value tokens consumed by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Arity {
    /// The option is a flag; it takes no value.
    Zero,
    /// The option takes precisely one value.
    One,
}

impl Distribution<Arity> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Arity {
        match rng.gen_range(0..2) {
            0 => Arity::Zero,
            1 => Arity::One,
            _ => unreachable!("internal error - impossible gen_range()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionSpec {
    names: Vec<String>,
    arity: Arity,
    hidden: bool,
}

impl OptionSpec {
    pub(crate) fn new(names: Vec<String>, arity: Arity) -> Self {
        Self {
            names,
            arity,
            hidden: false,
        }
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn arity(&self) -> Arity {
        self.arity
    }

    pub(crate) fn hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn hide(&mut self) {
        self.hidden = true;
    }

    fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PositionalSpec {
    name: String,
    required: bool,
}

impl PositionalSpec {
    pub(crate) fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn required(&self) -> bool {
        self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RestSpec {
    name: String,
    required: usize,
}

impl RestSpec {
    pub(crate) fn new(name: impl Into<String>, required: usize) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn required(&self) -> usize {
        self.required
    }
}

/// The full grammar of one registered command: its subcommand paths, options,
/// positional slots, and trailing capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandSpec {
    pub(crate) index: usize,
    pub(crate) paths: Vec<Vec<String>>,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) positionals: Vec<PositionalSpec>,
    pub(crate) rest: Option<RestSpec>,
    pub(crate) proxy: bool,
}

/// How a single option-shaped token resolves against one command's option set.
///
/// A short batch may settle several flags and still leave an arity-1 tail, so
/// both parts are carried together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionMatch {
    /// Arity-0 occurrences settled by this token, in order.
    pub(crate) flags: Vec<(String, bool)>,
    /// The arity-1 part of the token, if any.
    pub(crate) tail: Option<OptionTail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OptionTail {
    /// The value arrived within the same token (`--key=123`, `-k=123`, `-abcXYZ`).
    Inline { name: String, value: String },
    /// The value must arrive as the next token.
    Awaiting { name: String },
}

impl CommandSpec {
    pub(crate) fn is_default(&self) -> bool {
        self.paths.iter().any(|path| path.is_empty())
    }

    pub(crate) fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.answers_to(name))
    }

    /// Resolve an option-shaped token against this command's option set.
    /// `None` means the token is not a legal option specifier for this command.
    pub(crate) fn resolve_option(&self, token: &Token) -> Option<OptionMatch> {
        match token {
            Token::Option(raw) => {
                if let Some(spec) = self.find_option(raw) {
                    return Some(match spec.arity() {
                        Arity::Zero => OptionMatch {
                            flags: vec![(raw.clone(), true)],
                            tail: None,
                        },
                        Arity::One => OptionMatch {
                            flags: Vec::default(),
                            tail: Some(OptionTail::Awaiting { name: raw.clone() }),
                        },
                    });
                }

                if let Some(positive) = raw.strip_prefix(NEGATION_PREFIX) {
                    let positive = format!("--{positive}");
                    if let Some(spec) = self.find_option(&positive) {
                        if spec.arity() == Arity::Zero {
                            return Some(OptionMatch {
                                flags: vec![(positive, false)],
                                tail: None,
                            });
                        }
                    }
                }

                self.resolve_batch(raw, None)
            }
            Token::OptionWithValue(name, value) => {
                if let Some(spec) = self.find_option(name) {
                    // Inline values are only legal at arity 1.
                    return match spec.arity() {
                        Arity::One => Some(OptionMatch {
                            flags: Vec::default(),
                            tail: Some(OptionTail::Inline {
                                name: name.clone(),
                                value: value.clone(),
                            }),
                        }),
                        Arity::Zero => None,
                    };
                }

                self.resolve_batch(name, Some(value))
            }
            _ => None,
        }
    }

    // Resolve 'short' flag batches, such as (with -a, -b arity 0 and -c arity 1):
    //  -ab
    //  -abc
    //  -abc ..
    //  -abc=..
    //  -abcXYZ
    fn resolve_batch(&self, raw: &str, inline: Option<&str>) -> Option<OptionMatch> {
        if raw.starts_with("--") {
            return None;
        }

        let body = raw.strip_prefix('-')?;

        if body.chars().count() < 2 {
            return None;
        }

        let mut flags = Vec::default();

        for (index, single) in body.char_indices() {
            let name = format!("-{single}");
            let spec = self.find_option(&name)?;

            match spec.arity() {
                Arity::Zero => flags.push((name, true)),
                Arity::One => {
                    // Remaining characters, if any, bind as this option's value.
                    let remainder = &body[index + single.len_utf8()..];
                    let tail = match inline {
                        Some(value) => {
                            if !remainder.is_empty() {
                                // An arity-1 short must come last to use the '=' syntax.
                                return None;
                            }
                            OptionTail::Inline {
                                name,
                                value: value.to_string(),
                            }
                        }
                        None if remainder.is_empty() => OptionTail::Awaiting { name },
                        None => OptionTail::Inline {
                            name,
                            value: remainder.to_string(),
                        },
                    };

                    return Some(OptionMatch {
                        flags,
                        tail: Some(tail),
                    });
                }
            }
        }

        match inline {
            // Every batched short was arity 0; nothing may claim the '=' value.
            Some(_) => None,
            None => Some(OptionMatch { flags, tail: None }),
        }
    }
}
