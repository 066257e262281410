use std::path::PathBuf;

use anyhow::Context;
use balloon_predictor::plot::{read_track_csv, render_track_png};
use balloon_predictor::terrain::TerrainGrid;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render a predicted track over the terrain grid"
)]
struct Cli {
    /// Track CSV written by `predict --track-csv`
    #[arg(long)]
    track: PathBuf,
    /// Terrain grid (`lon lat elevation` rows)
    #[arg(long)]
    terrain: PathBuf,
    #[arg(long, default_value = "artifacts/track.png")]
    output: PathBuf,
    #[arg(long, default_value_t = 1000)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    balloon_predictor::init_tracing("warn");
    let cli = Cli::parse();
    let track = read_track_csv(&cli.track)
        .with_context(|| format!("reading {}", cli.track.display()))?;
    let terrain = TerrainGrid::from_path(&cli.terrain)?;
    render_track_png(&cli.output, terrain.samples(), &track, (cli.width, cli.height))?;
    println!("wrote {}", cli.output.display());
    Ok(())
}
