pub(crate) mod handler;
pub(crate) mod log;
