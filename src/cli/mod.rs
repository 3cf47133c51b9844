//! CLI module for reposcope
//!
//! - Argument parsing (`args`)
//! - Command dispatch and the `run_all` orchestrator (`commands`)
//! - Logging and thread pool setup (`setup`)

pub mod args;
pub mod commands;
pub mod setup;

pub use args::{Cli, Commands};
pub use commands::{run, run_all, tree_analyzers, RunContext};
pub use setup::{configure_thread_pool, init_logging};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
