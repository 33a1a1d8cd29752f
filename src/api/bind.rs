use crate::machine::{OptionPayload, RunState};

// The registered setters are erased behind this alias so that a command's
// binding can run without knowledge of the concrete field types.
pub(crate) type Transform<C> = Box<dyn Fn(&mut C, &mut MatchedArgs)>;

/// A destructive cursor over the winning branch's binding.
///
/// Option lookups are repeatable; positionals are consumed in match order, one
/// named slot at a time, with the trailing capture taking whatever remains.
pub(crate) struct MatchedArgs<'m> {
    state: &'m RunState,
    cursor: usize,
}

impl<'m> MatchedArgs<'m> {
    pub(crate) fn new(state: &'m RunState) -> Self {
        Self { state, cursor: 0 }
    }

    pub(crate) fn path(&self) -> &[String] {
        &self.state.path
    }

    /// The last occurrence wins, so `--force --no-force` nets `false`.
    pub(crate) fn flag(&self, names: &[String]) -> Option<bool> {
        self.state.options.iter().rev().find_map(|option| {
            if names.contains(&option.name) {
                match &option.value {
                    OptionPayload::Flag(value) => Some(*value),
                    _ => unreachable!("internal error - flag option bound to a value"),
                }
            } else {
                None
            }
        })
    }

    /// The last occurrence wins.
    pub(crate) fn value(&self, names: &[String]) -> Option<String> {
        self.values(names).pop()
    }

    /// Every occurrence, in match order.
    pub(crate) fn values(&self, names: &[String]) -> Vec<String> {
        self.state
            .options
            .iter()
            .filter(|option| names.contains(&option.name))
            .map(|option| match &option.value {
                OptionPayload::Value(value) => value.clone(),
                _ => unreachable!("internal error - valued option bound without a value"),
            })
            .collect()
    }

    /// Consume the next named positional slot.
    pub(crate) fn next_positional(&mut self) -> Option<String> {
        match self.state.positionals.get(self.cursor) {
            Some(positional) if !positional.extra => {
                self.cursor += 1;
                Some(positional.value.clone())
            }
            _ => None,
        }
    }

    /// Consume every remaining positional, the rest/proxy capture included.
    pub(crate) fn remaining(&mut self) -> Vec<String> {
        let out = self.state.positionals[self.cursor..]
            .iter()
            .map(|positional| positional.value.clone())
            .collect();
        self.cursor = self.state.positionals.len();
        out
    }
}
