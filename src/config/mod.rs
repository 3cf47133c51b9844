//! Configuration for reposcope, read from `.reposcope.toml`.
//!
//! Every section is optional. Analyzers never read the configuration
//! themselves: callers copy the relevant section into each analyzer when
//! constructing it.

mod core;
mod loader;
mod thresholds;

pub use core::{OutputConfig, ReposcopeConfig, WalkerConfig};
pub use loader::{
    directory_ancestors, discover_config, load_config_file, parse_config, CONFIG_FILE_NAME,
};
pub use thresholds::{ComplexityThresholds, ContributorSettings, IssueTrackerSettings};
