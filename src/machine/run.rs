use std::cmp::Reverse;

use crate::constant::*;
use crate::machine::model::*;
use crate::model::Arity;

#[cfg(feature = "debug")]
use tracing::debug;

/// Where and why matching died: the offending token (`None` at end-of-input),
/// the literal tokens that would have been legal instead, and the commands
/// still alive at the deepest frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchFailure {
    pub(crate) token_index: usize,
    pub(crate) token: Option<String>,
    pub(crate) expected: Vec<String>,
    pub(crate) candidates: Vec<usize>,
}

type Branch = (NodeId, RunState);

enum Feed<'t> {
    Sentinel(Token),
    Raw(&'t str),
}

/// Advance a frontier of live branches over the full input.
/// Returns the surviving terminal states, of which there is at least one.
pub(crate) fn run(machine: &Machine, args: &[&str]) -> Result<Vec<RunState>, MatchFailure> {
    let mut frontier: Vec<Branch> = vec![(0, RunState::initial())];
    frontier = advance(machine, &frontier, &Feed::Sentinel(Token::StartOfInput));

    for (index, raw) in args.iter().copied().enumerate() {
        let next = advance(machine, &frontier, &Feed::Raw(raw));

        #[cfg(feature = "debug")]
        {
            let before = frontier.len();
            let after = next.len();
            debug!("Fed '{raw}' to {before} branch(es); {after} survive.");
        }

        if next.is_empty() {
            return Err(failure(machine, &frontier, index, Some(raw)));
        }

        frontier = next;
    }

    let next = advance(machine, &frontier, &Feed::Sentinel(Token::EndOfInput));

    if next.is_empty() {
        return Err(failure(machine, &frontier, args.len(), None));
    }

    Ok(next
        .into_iter()
        .map(|(node, state)| {
            debug_assert!(machine.terminals.contains_key(&node));
            state
        })
        .collect())
}

fn advance(machine: &Machine, frontier: &[Branch], feed: &Feed) -> Vec<Branch> {
    let mut next: Vec<Branch> = Vec::default();

    for (node, state) in frontier {
        let token = match feed {
            Feed::Sentinel(token) => token.clone(),
            Feed::Raw(raw) => Token::classify(raw, state),
        };
        let raw = match feed {
            Feed::Sentinel(_) => "",
            Feed::Raw(raw) => *raw,
        };

        for transition in &machine.nodes[*node].transitions {
            if machine.test(&transition.tester, &token) {
                let reduced = machine.reduce(&transition.reducer, state.clone(), &token, raw);

                // Frontier compaction: structurally equal branches collapse.
                if !next
                    .iter()
                    .any(|(n, s)| *n == transition.target && *s == reduced)
                {
                    next.push((transition.target, reduced));
                }
            }
        }
    }

    next
}

fn failure(machine: &Machine, frontier: &[Branch], index: usize, token: Option<&str>) -> MatchFailure {
    let mut candidates: Vec<usize> = Vec::default();

    for (node, _) in frontier {
        if let Some(command) = machine.nodes[*node].command {
            if !candidates.contains(&command) {
                candidates.push(command);
            }
        }
    }

    MatchFailure {
        token_index: index,
        token: token.map(|t| t.to_string()),
        expected: literals(machine, frontier),
        candidates,
    }
}

/// Among the surviving terminal branches, pick the single winner.
///
/// Help capture takes precedence; otherwise the longest consumed path wins,
/// then the fewest rest-captured positionals, then the earliest registration.
pub(crate) fn select(mut terminals: Vec<RunState>) -> Option<RunState> {
    let help = terminals.iter().any(|state| state.help);
    terminals.retain(|state| state.help == help);

    terminals.into_iter().min_by_key(|state| {
        let selection = state
            .selected
            .expect("internal error - terminal branch without a selection");
        (
            Reverse(state.path.len()),
            state.extra_count(),
            selection.command(),
        )
    })
}

/// Enumerate the literal tokens that could legally extend the input.
///
/// With `partial`, the final token is a prefix to complete; otherwise the
/// suggestions follow the full input. An input the machine rejects yields no
/// suggestions.
pub(crate) fn suggest(machine: &Machine, args: &[&str], partial: bool) -> Vec<String> {
    let (feed, prefix) = match args.split_last() {
        Some((last, rest)) if partial => (rest, Some(*last)),
        _ => (args, None),
    };

    let mut frontier: Vec<Branch> = vec![(0, RunState::initial())];
    frontier = advance(machine, &frontier, &Feed::Sentinel(Token::StartOfInput));

    for raw in feed.iter().copied() {
        frontier = advance(machine, &frontier, &Feed::Raw(raw));

        if frontier.is_empty() {
            return Vec::default();
        }
    }

    let mut out = literals(machine, &frontier);

    if let Some(prefix) = prefix {
        out.retain(|suggestion| suggestion.starts_with(prefix));
    }

    out
}

// The enumerable next tokens across all live branches: path words, option
// names (hidden ones excluded), the options separator, and the help switches.
fn literals(machine: &Machine, frontier: &[Branch]) -> Vec<String> {
    let mut out: Vec<String> = Vec::default();

    for (node, state) in frontier {
        let muted = state.ignore_options || state.proxying;

        for transition in &machine.nodes[*node].transitions {
            match &transition.tester {
                Tester::Word(word) => out.push(word.clone()),
                Tester::OptionsSeparator if !muted => out.push(END_OF_OPTIONS.to_string()),
                Tester::Help if !muted => {
                    out.push(HELP_SHORT.to_string());
                    out.push(HELP_LONG.to_string());
                }
                Tester::SettledOption(command) if !muted => {
                    for option in &machine.specs[*command].options {
                        if option.arity() == Arity::Zero && !option.hidden() {
                            out.extend(option.names().iter().cloned());
                        }
                    }
                }
                Tester::AwaitingOption(command) if !muted => {
                    for option in &machine.specs[*command].options {
                        if option.arity() == Arity::One && !option.hidden() {
                            out.extend(option.names().iter().cloned());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // Case-insensitive lexicographic order, upper-case first on ties.
    out.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    out.dedup();
    out
}
