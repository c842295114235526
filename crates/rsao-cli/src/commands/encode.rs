//! Full encoding: impulse response in, room object JSON out.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rsao_analysis::{Encoder, EncoderConfig, RoomDimensions};
use rsao_io::{RoomObject, load_config, read_bformat, write_room_object};

#[derive(Args)]
pub struct EncodeArgs {
    /// Input 4-channel B-format WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Room length, width and height in metres
    #[arg(long, num_args = 3, value_names = ["L", "W", "H"], allow_negative_numbers = true)]
    room: Option<Vec<f64>>,

    /// Encoder configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file (defaults to the input path with a .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Object name (defaults to the input file stem)
    #[arg(long)]
    name: Option<String>,

    /// Object type written to the room object
    #[arg(long, default_value = "rsao")]
    object_type: String,

    /// Number of discrete early reflections (overrides the configuration file)
    #[arg(short = 'n', long)]
    n_discrete: Option<usize>,

    /// Skip linear-prediction pre-whitening during onset detection
    #[arg(long)]
    no_lpc: bool,

    /// Skip late reverberation estimation
    #[arg(long)]
    early_only: bool,

    /// Also write the full parameter set as JSON
    #[arg(long, value_name = "FILE")]
    parameters: Option<PathBuf>,
}

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EncoderConfig::default(),
    };
    if let Some(n) = args.n_discrete {
        config.n_discrete = n;
    }
    if args.no_lpc {
        config.use_lpc = false;
    }
    if args.early_only {
        config.estimate_late = false;
    }
    tracing::debug!(?config, "encoder configuration");

    let room = args
        .room
        .as_deref()
        .map(RoomDimensions::from_slice)
        .transpose()?;

    let signal = read_bformat(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    println!(
        "Encoding {} ({} samples, {} Hz, {:.2}s)",
        args.input.display(),
        signal.len(),
        signal.sample_rate(),
        signal.len() as f64 / signal.sample_rate()
    );

    let params = Encoder::new(config)?.encode(&signal, room.as_ref())?;

    println!();
    println!("{:<14} {:>10} {:>10} {:>8} {:>8}", "label", "toa (ms)", "level", "az", "el");
    for (label, early) in params.early() {
        println!(
            "{:<14} {:>10.3} {:>10.4} {:>8.0} {:>8.0}",
            label.to_string(),
            early.toa * 1000.0,
            early.level,
            early.doa.azimuth,
            early.doa.elevation
        );
    }
    if let Some(late) = params.late() {
        println!();
        println!("Late reverberation: onset {:.2} ms", late.toa * 1000.0);
        println!("{:>10} {:>10} {:>12} {:>10}", "band (Hz)", "RT (s)", "decay (1/s)", "level");
        for (i, center) in late.bandcut.iter().enumerate() {
            println!(
                "{:>10.1} {:>10.3} {:>12.2} {:>10.4}",
                center, late.reverb_times[i], late.expdecays[i], late.level[i]
            );
        }
    }

    let name = args.name.clone().unwrap_or_else(|| {
        args.input
            .file_stem()
            .map_or_else(|| "room".to_string(), |s| s.to_string_lossy().into_owned())
    });
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("json"));
    let object = RoomObject::from_parameters(&params, name, args.object_type.clone())?;
    write_room_object(&output, &object)?;
    println!();
    println!("Wrote {}", output.display());

    if let Some(path) = &args.parameters {
        let json = serde_json::to_string_pretty(&params)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
