//! Download a RAP model sounding for later use with `predict model --profile`.

use std::path::PathBuf;

use anyhow::Context;
use balloon_predictor::importer::{fetch_rap_sounding, rap_sounding_url, save_text};
use balloon_predictor::sounding::rap;
use chrono::NaiveDateTime;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch a RAP point sounding")]
struct Cli {
    /// Forecast valid time (YYYYMMDDHH, UTC)
    #[arg(long)]
    time: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
    #[arg(long, default_value = "data/rap_sounding.txt")]
    output: PathBuf,
    /// Print the query URL without fetching
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    balloon_predictor::init_tracing("warn");
    let cli = Cli::parse();
    let valid = NaiveDateTime::parse_from_str(&format!("{}0000", cli.time), "%Y%m%d%H%M%S")
        .with_context(|| format!("invalid forecast time '{}' (expected YYYYMMDDHH)", cli.time))?;

    if cli.dry_run {
        println!("{}", rap_sounding_url(valid, cli.lat, cli.lon));
        return Ok(());
    }

    println!("[download] {}", rap_sounding_url(valid, cli.lat, cli.lon));
    let body = fetch_rap_sounding(valid, cli.lat, cli.lon)?;
    let levels = rap::parse(&body)
        .map(|profile| profile.len())
        .context("response is not a RAP sounding")?;
    save_text(&cli.output, &body)?;
    println!("[ok] {} levels -> {}", levels, cli.output.display());
    Ok(())
}
