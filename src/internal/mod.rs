pub(crate) mod env;
pub(crate) mod exporters;
