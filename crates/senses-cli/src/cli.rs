//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Device signal overrides for the fingerprint command.
#[derive(Debug, Clone, Default, Args)]
pub struct SignalArgs {
    /// Browser user-agent string
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Platform string (e.g. "MacIntel", "Win32")
    #[arg(long)]
    pub platform: Option<String>,

    /// Negotiated language (e.g. "en-US")
    #[arg(long)]
    pub language: Option<String>,

    /// Screen size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_screen)]
    pub screen: Option<(u32, u32)>,
}

/// Parse a `WIDTHxHEIGHT` screen descriptor.
pub fn parse_screen(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((w, h))
}

#[derive(Parser)]
#[command(name = "senses")]
#[command(author, version, about = "Inspect persona sense snapshots", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print canonical sense ids
    Normalize {
        /// Raw ids in any casing convention
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Derive the device fingerprint for a set of signals
    Fingerprint {
        #[command(flatten)]
        signals: SignalArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print per-sense activation and the aggregate counters of a snapshot
    Summary {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Persist a snapshot's pending connections and persona document
    Push {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Persistence API base URL (overrides config)
        #[arg(long, env = "SENSES_SERVICE_URL")]
        url: Option<String>,

        /// List the calls without sending them
        #[arg(long)]
        dry_run: bool,

        /// Write the reconciled snapshot back to the input file
        #[arg(long, conflicts_with = "dry_run")]
        write: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file if none exists
    Init,
}
