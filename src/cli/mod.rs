//! CLI module - argument parsing, interactive prompts and subcommands

mod args;
mod prompts;
pub mod simulate;

pub use args::{Cli, Commands};
pub use prompts::*;
pub use simulate::{generate_candidates, run_simulate};
