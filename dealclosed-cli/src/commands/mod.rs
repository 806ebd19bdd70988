//! Subcommand implementations for the DealClosed CLI.

pub mod completion;
pub mod config;
pub mod inbox;
pub mod session;
