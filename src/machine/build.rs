use std::collections::HashMap;

use crate::machine::model::*;
use crate::model::CommandSpec;

/// Compile the union of every command grammar into a single machine.
///
/// Each command contributes one linear-with-branches chain per declared path,
/// all hanging off the shared initial node. End-of-input acceptance is wired at
/// build time into every node from which the command is legally complete.
pub(crate) fn compile(specs: Vec<CommandSpec>) -> Machine {
    let mut builder = Builder {
        nodes: vec![Node::new("initial", None)],
        terminals: HashMap::default(),
    };

    for spec in &specs {
        builder.register(spec);
    }

    Machine {
        nodes: builder.nodes,
        terminals: builder.terminals,
        specs,
    }
}

const INITIAL: NodeId = 0;

struct Builder {
    nodes: Vec<Node>,
    terminals: HashMap<NodeId, Selection>,
}

impl Builder {
    fn inject(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn transition(&mut self, source: NodeId, tester: Tester, target: NodeId, reducer: Reducer) {
        self.nodes[source].transitions.push(Transition {
            tester,
            target,
            reducer,
        });
    }

    fn register(&mut self, spec: &CommandSpec) {
        let command = spec.index;

        let terminal = self.inject(Node::new(format!("terminal({command})"), Some(command)));
        self.terminals.insert(terminal, Selection::Command(command));

        let help_terminal = self.inject(Node::new(format!("help-terminal({command})"), Some(command)));
        self.terminals.insert(help_terminal, Selection::Help(command));

        // Once help is requested, the rest of the input is swallowed verbatim.
        let help = self.inject(Node::new(format!("help({command})"), Some(command)));
        self.transition(help, Tester::Always, help, Reducer::Identity);
        self.transition(
            help,
            Tester::EndOfInput,
            help_terminal,
            Reducer::Select(Selection::Help(command)),
        );

        for path in &spec.paths {
            self.register_path(spec, path, terminal, help);
        }
    }

    fn register_path(&mut self, spec: &CommandSpec, path: &[String], terminal: NodeId, help: NodeId) {
        let command = spec.index;

        let start = self.inject(Node::new(format!("start({command})"), Some(command)));
        self.transition(INITIAL, Tester::StartOfInput, start, Reducer::Identity);

        // Path words come first; options are not recognized until the path is
        // fully consumed.
        let mut cursor = start;
        for word in path {
            let next = self.inject(Node::new(format!("path({command}, {word})"), Some(command)));
            self.transition(cursor, Tester::Word(word.clone()), next, Reducer::PushPath);
            cursor = next;
        }

        self.register_options(spec, cursor, help);

        let rest_minimum = spec.rest.as_ref().map(|rest| rest.required()).unwrap_or(0);
        let mut remaining_required = spec.positionals.iter().filter(|p| p.required()).count();
        let mut acceptable = Vec::default();

        if remaining_required == 0 && rest_minimum == 0 {
            acceptable.push(cursor);
        }

        for positional in &spec.positionals {
            let next = self.inject(Node::new(
                format!("positional({command}, {name})", name = positional.name()),
                Some(command),
            ));
            self.transition(cursor, Tester::Positional, next, Reducer::PushPositional);
            self.register_options(spec, next, help);
            cursor = next;

            if positional.required() {
                remaining_required -= 1;
            }

            if remaining_required == 0 && rest_minimum == 0 {
                acceptable.push(cursor);
            }
        }

        if spec.proxy {
            let name = spec
                .rest
                .as_ref()
                .map(|rest| rest.name().to_string())
                .unwrap_or_else(|| "rest".to_string());

            // The proxy chain accepts every token verbatim; no options, no
            // separator, no help.
            for ordinal in 0..rest_minimum {
                let next = self.inject(Node::new(
                    format!("proxy({command}, {name}[{ordinal}])"),
                    Some(command),
                ));
                self.transition(cursor, Tester::Always, next, Reducer::PushProxied);
                cursor = next;
            }

            self.transition(cursor, Tester::Always, cursor, Reducer::PushProxied);
            if rest_minimum > 0 {
                acceptable.push(cursor);
            }
        } else if let Some(rest) = &spec.rest {
            for ordinal in 0..rest.required() {
                let next = self.inject(Node::new(
                    format!("rest({command}, {name}[{ordinal}])", name = rest.name()),
                    Some(command),
                ));
                self.transition(cursor, Tester::Positional, next, Reducer::PushExtra);
                self.register_options(spec, next, help);
                cursor = next;
            }

            self.transition(cursor, Tester::Positional, cursor, Reducer::PushExtra);
            if rest.required() > 0 {
                acceptable.push(cursor);
            }
        }

        for node in acceptable {
            self.transition(
                node,
                Tester::EndOfInput,
                terminal,
                Reducer::Select(Selection::Command(command)),
            );
        }
    }

    // Every node where options are permitted carries the same self-loops:
    // settled options, the awaiting arity-1 detour, the '--' separator, and
    // the help escape.
    fn register_options(&mut self, spec: &CommandSpec, node: NodeId, help: NodeId) {
        let command = spec.index;

        self.transition(
            node,
            Tester::SettledOption(command),
            node,
            Reducer::PushOption(command),
        );

        let value = self.inject(Node::new(format!("option-value({command})"), Some(command)));
        self.transition(
            node,
            Tester::AwaitingOption(command),
            value,
            Reducer::PushOption(command),
        );
        self.transition(value, Tester::Positional, node, Reducer::SetPendingValue);

        self.transition(node, Tester::OptionsSeparator, node, Reducer::InhibitOptions);
        self.transition(node, Tester::Help, help, Reducer::UseHelp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Arity, OptionSpec, PositionalSpec, RestSpec};

    fn command(index: usize, paths: Vec<Vec<&str>>) -> CommandSpec {
        CommandSpec {
            index,
            paths: paths
                .into_iter()
                .map(|path| path.into_iter().map(|word| word.to_string()).collect())
                .collect(),
            options: Vec::default(),
            positionals: Vec::default(),
            rest: None,
            proxy: false,
        }
    }

    #[test]
    fn compile_empty() {
        // Execute
        let machine = compile(Vec::default());

        // Verify
        assert_eq!(machine.nodes.len(), 1);
        assert!(machine.nodes[INITIAL].transitions.is_empty());
        assert!(machine.terminals.is_empty());
    }

    #[test]
    fn compile_default_command() {
        // Setup
        let spec = command(0, vec![vec![]]);

        // Execute
        let machine = compile(vec![spec]);

        // Verify
        assert_eq!(machine.nodes[INITIAL].transitions.len(), 1);
        let start = machine.nodes[INITIAL].transitions[0].target;
        // An argument-less command accepts the end of input immediately.
        assert!(machine.nodes[start]
            .transitions
            .iter()
            .any(|t| t.tester == Tester::EndOfInput));
        assert_eq!(machine.terminals.len(), 2);
    }

    #[test]
    fn compile_path_words() {
        // Setup
        let spec = command(0, vec![vec!["remote", "add"]]);

        // Execute
        let machine = compile(vec![spec]);

        // Verify
        let start = machine.nodes[INITIAL].transitions[0].target;
        let word = machine.nodes[start]
            .transitions
            .iter()
            .find(|t| t.tester == Tester::Word("remote".to_string()))
            .unwrap();
        assert_eq!(word.reducer, Reducer::PushPath);
        // No options before the path is fully consumed.
        assert_eq!(machine.nodes[start].transitions.len(), 1);
        let next = machine.nodes[word.target].transitions[0].clone();
        assert_eq!(next.tester, Tester::Word("add".to_string()));
    }

    #[test]
    fn compile_multiple_paths() {
        // Setup
        let spec = command(0, vec![vec!["add"], vec!["a"]]);

        // Execute
        let machine = compile(vec![spec]);

        // Verify
        assert_eq!(machine.nodes[INITIAL].transitions.len(), 2);
        // Both chains accept into the same terminal.
        assert_eq!(
            machine
                .terminals
                .values()
                .filter(|selection| matches!(selection, Selection::Command(0)))
                .count(),
            1
        );
    }

    #[test]
    fn compile_option_loop() {
        // Setup
        let mut spec = command(0, vec![vec![]]);
        spec.options = vec![OptionSpec::new(vec!["--force".to_string()], Arity::Zero)];

        // Execute
        let machine = compile(vec![spec]);

        // Verify
        let start = machine.nodes[INITIAL].transitions[0].target;
        let transitions = &machine.nodes[start].transitions;
        let settled = transitions
            .iter()
            .find(|t| t.tester == Tester::SettledOption(0))
            .unwrap();
        assert_eq!(settled.target, start);
        assert!(transitions
            .iter()
            .any(|t| t.tester == Tester::OptionsSeparator));
        assert!(transitions.iter().any(|t| t.tester == Tester::Help));
        // The awaiting detour returns to the loop node once the value arrives.
        let awaiting = transitions
            .iter()
            .find(|t| t.tester == Tester::AwaitingOption(0))
            .unwrap();
        let back = machine.nodes[awaiting.target]
            .transitions
            .iter()
            .find(|t| t.tester == Tester::Positional)
            .unwrap();
        assert_eq!(back.target, start);
    }

    #[test]
    fn compile_required_positional_defers_acceptance() {
        // Setup
        let mut spec = command(0, vec![vec![]]);
        spec.positionals = vec![PositionalSpec::new("file", true)];

        // Execute
        let machine = compile(vec![spec]);

        // Verify
        let start = machine.nodes[INITIAL].transitions[0].target;
        assert!(!machine.nodes[start]
            .transitions
            .iter()
            .any(|t| t.tester == Tester::EndOfInput));
        let filled = machine.nodes[start]
            .transitions
            .iter()
            .find(|t| t.tester == Tester::Positional)
            .unwrap()
            .target;
        assert!(machine.nodes[filled]
            .transitions
            .iter()
            .any(|t| t.tester == Tester::EndOfInput));
    }

    #[test]
    fn compile_rest_minimum() {
        // Setup
        let mut spec = command(0, vec![vec![]]);
        spec.rest = Some(RestSpec::new("items", 2));

        // Execute
        let machine = compile(vec![spec]);

        // Verify: exactly one node accepts the end of input as the command
        // itself (the help escape aside), and it self-loops.
        let acceptors: Vec<NodeId> = machine
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.transitions
                    .iter()
                    .any(|t| t.reducer == Reducer::Select(Selection::Command(0)))
            })
            .map(|(id, _)| id)
            .collect();
        assert_eq!(acceptors.len(), 1);
        let looped = machine.nodes[acceptors[0]]
            .transitions
            .iter()
            .find(|t| t.tester == Tester::Positional)
            .unwrap();
        assert_eq!(looped.target, acceptors[0]);
    }

    #[test]
    fn compile_proxy_loops_on_any_token() {
        // Setup
        let mut spec = command(0, vec![vec!["exec"]]);
        spec.proxy = true;
        spec.rest = Some(RestSpec::new("args", 0));

        // Execute
        let machine = compile(vec![spec]);

        // Verify: the node after the path swallows any token verbatim, and
        // accepts the end of input without one.
        let proxy = machine
            .nodes
            .iter()
            .position(|node| {
                node.transitions
                    .iter()
                    .any(|t| t.tester == Tester::Always && t.reducer == Reducer::PushProxied)
            })
            .unwrap();
        let swallow = machine.nodes[proxy]
            .transitions
            .iter()
            .find(|t| t.tester == Tester::Always)
            .unwrap();
        assert_eq!(swallow.target, proxy);
        assert!(machine.nodes[proxy]
            .transitions
            .iter()
            .any(|t| t.tester == Tester::EndOfInput));
    }

    #[test]
    fn compile_proxy_minimum_chain_has_no_options() {
        // Setup
        let mut spec = command(0, vec![vec!["exec"]]);
        spec.options = vec![OptionSpec::new(vec!["-v".to_string()], Arity::Zero)];
        spec.proxy = true;
        spec.rest = Some(RestSpec::new("args", 1));

        // Execute
        let machine = compile(vec![spec]);

        // Verify: the minimum chain is pure proxy capture.
        let chained = machine
            .nodes
            .iter()
            .find(|node| {
                node.transitions
                    .iter()
                    .any(|t| t.tester == Tester::Always && t.reducer == Reducer::PushProxied)
                    && node
                        .transitions
                        .iter()
                        .all(|t| !matches!(t.tester, Tester::SettledOption(_)))
            })
            .unwrap();
        // The final proxy node both loops on itself and accepts the end of input.
        let last = machine
            .nodes
            .iter()
            .position(|node| {
                node.transitions
                    .iter()
                    .any(|t| t.reducer == Reducer::PushProxied)
                    && node
                        .transitions
                        .iter()
                        .any(|t| t.tester == Tester::EndOfInput)
            })
            .unwrap();
        assert!(machine.nodes[last]
            .transitions
            .iter()
            .any(|t| t.tester == Tester::Always && t.target == last));
        assert!(!chained.transitions.is_empty());
    }
}
