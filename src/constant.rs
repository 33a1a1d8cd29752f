pub(crate) const HELP_SHORT: &str = "-h";
pub(crate) const HELP_LONG: &str = "--help";
pub(crate) const END_OF_OPTIONS: &str = "--";
pub(crate) const NEGATION_PREFIX: &str = "--no-";
