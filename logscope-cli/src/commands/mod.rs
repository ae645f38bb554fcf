//! Command handlers -- one module per subcommand

pub mod config;
pub mod search;
pub mod targets;
