//! fcp - formant cluster prominence analyzer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{AnalyzeCommand, ConfigCommand, DevicesCommand, LiveCommand, PlayCommand};

/// Measures how far the 2-4 kHz region of a voice rises above its spectral
/// trend, live from a microphone or offline from a WAV file.
///
/// Severity buckets:
///   blue    below 5 dB
///   green   5-10 dB
///   orange  10-15 dB
///   red     15 dB and above
///
/// Configuration is stored in ~/.fcp/config.yaml.
#[derive(Parser)]
#[command(name = "fcp")]
#[command(about = "Formant cluster prominence analyzer")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.fcp/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List audio devices
    Devices(DevicesCommand),
    /// Analyze a WAV file
    Analyze(AnalyzeCommand),
    /// Monitor the input device
    Live(LiveCommand),
    /// Play a WAV file with synchronised FCP
    Play(PlayCommand),
    /// Manage configuration
    Config(ConfigCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Devices(cmd) => cmd.run(&cli),
        Commands::Analyze(cmd) => cmd.run(&cli),
        Commands::Live(cmd) => cmd.run(&cli),
        Commands::Play(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
    }
}
