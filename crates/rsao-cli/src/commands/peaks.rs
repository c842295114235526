//! Onset detection on the W channel.

use std::path::PathBuf;

use clap::Args;
use rsao_analysis::{PeakDetector, PeakDetectorConfig};
use rsao_io::read_bformat;

#[derive(Args)]
pub struct PeaksArgs {
    /// Input 4-channel B-format WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Slope pruning threshold
    #[arg(long, default_value = "-0.05", allow_negative_numbers = true)]
    threshold: f64,

    /// Only search the first N samples
    #[arg(long)]
    truncation: Option<usize>,

    /// Skip linear-prediction pre-whitening
    #[arg(long)]
    no_lpc: bool,

    /// Whitening prediction order
    #[arg(long, default_value = "12")]
    lpc_order: usize,

    /// Show at most N onsets
    #[arg(long, default_value = "30")]
    limit: usize,
}

pub fn run(args: PeaksArgs) -> anyhow::Result<()> {
    let signal = read_bformat(&args.input)?;
    let config = PeakDetectorConfig {
        threshold: args.threshold,
        truncation: args.truncation,
        use_lpc: !args.no_lpc,
        lpc_order: args.lpc_order,
    };
    let peaks = PeakDetector::new(signal.sample_rate(), config).detect(signal.w())?;
    let onsets = peaks.onsets();

    println!(
        "{} onsets in {} ({} Hz)",
        onsets.len(),
        args.input.display(),
        signal.sample_rate()
    );
    println!("{:>10} {:>10} {:>10}", "sample", "time (ms)", "strength");
    for &onset in onsets.iter().take(args.limit) {
        println!(
            "{:>10} {:>10.3} {:>10.4}",
            onset,
            onset as f64 * 1000.0 / signal.sample_rate(),
            peaks.strength(onset)
        );
    }
    if onsets.len() > args.limit {
        println!("... {} more", onsets.len() - args.limit);
    }

    Ok(())
}
