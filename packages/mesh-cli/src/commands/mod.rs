//! CLI command implementations.

pub mod config;
pub mod dm;
pub mod whoami;
