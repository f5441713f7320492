//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (TOML channel manifest and allowlist)
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the stats/HUD demo against the configured channels
    Demo {
        /// Number of broadcast rounds
        #[arg(short, long, default_value_t = 5)]
        ticks: u32,
        /// Drop the second HUD listener before this tick
        #[arg(long)]
        drop_listener_at: Option<u32>,
    },
    /// Validate the configuration and report its channels and rules
    Validate,
    /// Register the manifest and print channel snapshots as JSON
    Channels,
    /// Print the built-in example configuration
    ExampleConfig,
}
