mod build;
mod model;
mod run;

pub(crate) use build::compile;
pub(crate) use model::{
    Machine, OptionPayload, OptionValue, PositionalValue, RunState, Selection, Token,
};
pub(crate) use run::{run, select, suggest, MatchFailure};
