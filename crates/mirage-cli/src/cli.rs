use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Mirage mock engine
#[derive(Debug, Parser)]
#[command(name = "mirage", version, about = "Resolve API calls against mock scenarios")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an activation route and print the test configuration as JSON
    Parse {
        /// Route such as `/chat/_test/empty/10?mock=sessions`
        href: String,
    },
    /// Validate every fixture below a directory
    Check {
        /// Fixture directory
        dir: PathBuf,
    },
    /// Resolve one request and print the decision as JSON
    Resolve {
        /// Fixture directory (defaults to `fixtures.directory` from the config)
        #[arg(long)]
        fixtures: Option<PathBuf>,

        /// Seed for generated data
        #[arg(long)]
        seed: Option<u64>,

        /// Activation route to apply before resolving
        #[arg(long)]
        route: Option<String>,

        /// HTTP method
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
}
