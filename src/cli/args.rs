use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reposcope")]
#[command(
    about = "Repository assessment: structure, complexity, dependencies, licenses, performance and GitHub activity",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Configuration file (defaults to the nearest .reposcope.toml)
    #[arg(long, global = true, env = "REPOSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format, else terminal)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Languages, frameworks, tooling, organization and documentation
    Structure {
        /// Repository root
        path: PathBuf,
    },

    /// Per-file complexity metrics and refactoring priorities
    Complexity { path: PathBuf },

    /// Declared dependencies, advisories and outdated versions
    Dependencies { path: PathBuf },

    /// Project and dependency licenses, compatibility and compliance
    Licenses { path: PathBuf },

    /// Performance anti-patterns in JavaScript/TypeScript and Python
    Performance { path: PathBuf },

    /// Review a pull request from its GitHub JSON payload
    Pr {
        /// PR JSON (GitHub REST shape with `files[]`)
        #[arg(long)]
        input: PathBuf,

        /// LCOV report used for the PR's test coverage
        #[arg(long)]
        lcov: Option<PathBuf>,
    },

    /// Contributor engagement from commits, PRs, reviews and issues
    Contributors {
        /// JSON object with `commits`, `prs`, `reviews` and `issues` arrays
        #[arg(long)]
        input: PathBuf,
    },

    /// Issue tracker health
    Issues {
        /// Issues JSON (array, or object with an `issues` array)
        #[arg(long)]
        issues: PathBuf,

        /// Pull requests JSON (array, or object with a `prs` array)
        #[arg(long)]
        prs: Option<PathBuf>,
    },

    /// Plan a framework migration
    Migrate {
        /// Repository root
        #[arg(required_unless_present = "list")]
        path: Option<PathBuf>,

        /// Migration type, e.g. react-class-to-hooks
        #[arg(long = "type", required_unless_present = "list")]
        migration_type: Option<String>,

        /// List the registered migration types
        #[arg(long)]
        list: bool,
    },

    /// Run every filesystem analyzer concurrently
    All {
        path: PathBuf,

        /// Worker threads (0 = one per CPU)
        #[arg(short, long, default_value = "0")]
        jobs: usize,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
