//! Module for generating shell completion scripts for the CLI.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

/// Generates shell completion scripts for the CLI.
pub fn generate_completion(shell: Shell) {
    let mut app = crate::Cli::command();
    generate(shell, &mut app, "dealclosed", &mut io::stdout());
}
