//! rsao CLI - encode B-format room impulse responses into reflection parameters.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rsao")]
#[command(author, version, about = "Room reflection encoder for B-format impulse responses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode an impulse response into a renderer room object
    Encode(commands::encode::EncodeArgs),

    /// List detected reflection onsets
    Peaks(commands::peaks::PeaksArgs),

    /// Predict the perceptual mixing time of a room
    MixingTime(commands::mixing_time::MixingTimeArgs),
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => commands::encode::run(args),
        Commands::Peaks(args) => commands::peaks::run(args),
        Commands::MixingTime(args) => commands::mixing_time::run(args),
    }
}
