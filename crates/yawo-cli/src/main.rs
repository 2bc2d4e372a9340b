use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "yawo")]
#[command(version)]
#[command(about = "Now playing overlay for YARG")]
struct Args {
    /// Folder with the overlay settings files
    #[arg(short, long, default_value = "settings", env = "YAWO_SETTINGS")]
    settings: PathBuf,

    /// Status file to watch, overrides CurrentSongFilePath.txt
    #[arg(long)]
    status: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the status file and write the stream output (default)
    Watch {
        /// Directory for the stream output files
        #[arg(short, long, default_value = "overlay")]
        output: PathBuf,
    },
    /// Read the status file once and print the enriched song
    Once {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Resolve the icon URL of a source id
    Icon {
        source_id: String,

        /// Seconds to wait for the source catalogs
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "yawo=debug" } else { "yawo=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = commands::load_config(&args.settings, args.status, args.interval_ms);

    match args.command {
        None => commands::watch::run(&config, &PathBuf::from("overlay")),
        Some(Command::Watch { output }) => commands::watch::run(&config, &output),
        Some(Command::Once { json }) => commands::once::run(&config, json),
        Some(Command::Icon { source_id, timeout }) => commands::icon::run(&source_id, timeout),
    }
}
