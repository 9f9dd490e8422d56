//! Subcommand implementations.

pub(crate) mod ask;
pub(crate) mod check;
pub(crate) mod config;
pub(crate) mod pending;
pub(crate) mod respond;
