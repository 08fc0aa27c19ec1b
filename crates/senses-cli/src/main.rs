use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod util;

use cli::{Cli, Commands};
use commands::{PushArgs, cmd_config, cmd_fingerprint, cmd_normalize, cmd_push, cmd_summary};
use config::Config;
use format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "senses", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let opts = FormatOptions::new(cli.no_color);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Normalize { ids } => cmd_normalize(&ids, output),
        Commands::Fingerprint { signals, format } => {
            cmd_fingerprint(signals, &config.device, format, output, &opts)
        }
        Commands::Summary { snapshot, format } => {
            cmd_summary(&snapshot, &config, format, output, &opts)
        }
        Commands::Push {
            snapshot,
            url,
            dry_run,
            write,
        } => {
            let args = PushArgs {
                snapshot,
                url,
                dry_run,
                write,
            };
            cmd_push(args, &config, output, &opts).await
        }
        Commands::Config { action } => cmd_config(action, &config, output),
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    }
}
