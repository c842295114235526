//! Mixing-time prediction from room dimensions.

use clap::Args;
use rsao_analysis::{MixingTimeModel, RoomDimensions};

#[derive(Args)]
pub struct MixingTimeArgs {
    /// Room length in metres
    #[arg(allow_negative_numbers = true)]
    length: f64,

    /// Room width in metres
    #[arg(allow_negative_numbers = true)]
    width: f64,

    /// Room height in metres
    #[arg(allow_negative_numbers = true)]
    height: f64,
}

pub fn run(args: MixingTimeArgs) -> anyhow::Result<()> {
    let room = RoomDimensions::new(args.length, args.width, args.height)?;
    let estimate = MixingTimeModel::default().estimate(&room);

    println!("Volume:          {:.2} m^3", estimate.volume);
    println!("Surface area:    {:.2} m^2", estimate.surface_area);
    println!("sqrt(V):         {:.2}", estimate.root_volume);
    println!("Mean free path:  {:.2} ms", estimate.mean_free_path_ms);
    println!("tmp50:           {:.2} ms", estimate.tmp50_ms);
    println!("tmp95:           {:.2} ms", estimate.tmp95_ms);

    Ok(())
}
