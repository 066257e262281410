//! Predict where a weather balloon lands.
//!
//! Launch values left off the command line are prompted for on stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use balloon_core::units::{minutes_to_seconds, seconds_to_minutes};
use balloon_predictor::config::{RunConfig, TerrainLookupConfig, load_run_config};
use balloon_predictor::importer::{self, DEFAULT_TRACKER_FEED_URL};
use balloon_predictor::plot::{self, TrackSample};
use balloon_predictor::run::{self, Launch, Prediction};
use balloon_predictor::sounding::{ProfileSource, ProfileTable, digicora, gps_csv, rap, tracker};
use balloon_predictor::terrain::TerrainGrid;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict a weather balloon landing point")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forward prediction from a radiosonde sounding file
    Sounding(SoundingArgs),
    /// Forward prediction from a RAP model sounding (fetched or saved)
    Model(ModelArgs),
    /// Descent prediction from the last fix of a tracked flight
    Tracker(TrackerArgs),
}

#[derive(Args, Debug)]
struct SoundingArgs {
    /// Sounding file
    #[arg(long)]
    profile: PathBuf,
    #[arg(long, value_enum, default_value_t = SoundingFormat::Digicora)]
    format: SoundingFormat,
    #[command(flatten)]
    launch: LaunchArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Forecast valid time (YYYYMMDDHH, UTC)
    #[arg(long, required_unless_present = "profile")]
    time: Option<String>,
    /// Saved RAP sounding text instead of fetching
    #[arg(long, conflicts_with = "time")]
    profile: Option<PathBuf>,
    #[command(flatten)]
    launch: LaunchArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct TrackerArgs {
    /// Tracker KML file, or `current` for the live feed
    #[arg(long)]
    feed: Option<String>,
    /// Tracker name inside the feed
    #[arg(long)]
    tracker: Option<String>,
    /// Live feed URL used with `--feed current`
    #[arg(long, default_value = DEFAULT_TRACKER_FEED_URL)]
    feed_url: String,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct LaunchArgs {
    /// Launch latitude (deg)
    #[arg(long, allow_hyphen_values = true, requires_all = ["lon", "alt"])]
    lat: Option<f64>,
    /// Launch longitude (deg)
    #[arg(long, allow_hyphen_values = true, requires_all = ["lat", "alt"])]
    lon: Option<f64>,
    /// Launch altitude (m MSL)
    #[arg(long, allow_hyphen_values = true, requires_all = ["lat", "lon"])]
    alt: Option<f64>,
    /// Time from launch to cutdown (minutes)
    #[arg(long, conflicts_with = "cutdown_seconds")]
    cutdown_minutes: Option<f64>,
    /// Time from launch to cutdown (seconds)
    #[arg(long)]
    cutdown_seconds: Option<f64>,
    /// Extra cutdown times to simulate (minutes, comma separated)
    #[arg(long, value_delimiter = ',')]
    sweep_minutes: Vec<f64>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Terrain grid (`lon lat elevation` rows)
    #[arg(long)]
    terrain: Option<PathBuf>,
    /// Terrain lookup strategy
    #[arg(long, value_enum)]
    lookup: Option<LookupArg>,
    /// Run configuration (YAML, or TOML by extension)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the track as CSV (`-` for stdout)
    #[arg(long)]
    track_csv: Option<PathBuf>,
    /// Write a JSON landing summary
    #[arg(long)]
    summary_json: Option<PathBuf>,
    /// Render the track over the terrain to a PNG
    #[arg(long)]
    plot: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum SoundingFormat {
    /// DigiCORA whitespace table, no GPS
    Digicora,
    /// CSV export with per-level GPS fixes
    GpsCsv,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum LookupArg {
    Nearest,
    AxisAligned,
}

impl From<LookupArg> for TerrainLookupConfig {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::Nearest => TerrainLookupConfig::Nearest,
            LookupArg::AxisAligned => TerrainLookupConfig::AxisAligned,
        }
    }
}

fn main() -> anyhow::Result<()> {
    balloon_predictor::init_tracing("warn");
    let cli = Cli::parse();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    match cli.command {
        Command::Sounding(args) => {
            let (source, profile) = match args.format {
                SoundingFormat::Digicora => (ProfileSource::Sounding, digicora::from_path(&args.profile)),
                SoundingFormat::GpsCsv => (ProfileSource::GpsSounding, gps_csv::from_path(&args.profile)),
            };
            let profile = profile.with_context(|| format!("reading {}", args.profile.display()))?;
            let launch = resolve_launch(&args.launch, &mut input)?;
            forward(source, &profile, launch, &args.launch.sweep_minutes, &args.output)
        }
        Command::Model(args) => {
            let launch = resolve_launch(&args.launch, &mut input)?;
            let profile = match (&args.profile, &args.time) {
                (Some(path), _) => rap::from_path(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, Some(time)) => {
                    let valid = parse_valid_time(time)?;
                    let text = importer::fetch_rap_sounding(valid, launch.latitude, launch.longitude)?;
                    rap::parse(&text).context("parsing fetched RAP sounding")?
                }
                (None, None) => bail!("either --time or --profile is required"),
            };
            forward(ProfileSource::Model, &profile, launch, &args.launch.sweep_minutes, &args.output)
        }
        Command::Tracker(args) => {
            let feed = match args.feed {
                Some(feed) => feed,
                None => prompt(&mut input, "Enter path to cutdown tracker file OR 'current': ")?,
            };
            let name = match args.tracker {
                Some(name) => name,
                None => prompt(&mut input, "Enter tracker number: ")?,
            };
            let profile = if feed == "current" {
                let kml = importer::fetch_tracker_feed(&args.feed_url)?;
                tracker::parse(&kml, &name)?
            } else {
                tracker::from_path(&feed, &name).with_context(|| format!("reading {feed}"))?
            };
            let run_config = load_config(&args.output)?;
            let terrain = load_terrain(&args.output, &run_config)?;
            let config = run::simulation_config(ProfileSource::Tracker, &run_config);
            let prediction = run::predict_descent(&profile, &terrain, &config)?;
            finish(&prediction, &terrain, &args.output, &run_config)
        }
    }
}

fn forward(
    source: ProfileSource,
    profile: &ProfileTable,
    launch: Launch,
    sweep_minutes: &[f64],
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let run_config = load_config(output)?;
    let terrain = load_terrain(output, &run_config)?;
    let config = run::simulation_config(source, &run_config);
    info!(levels = profile.len(), ?config, "running prediction");
    let sweep_s: Vec<f64> = sweep_minutes.iter().copied().map(minutes_to_seconds).collect();
    let prediction = run::predict_launch(source, profile, &terrain, launch, &sweep_s, &config)?;
    finish(&prediction, &terrain, output, &run_config)
}

fn finish(
    prediction: &Prediction,
    terrain: &TerrainGrid,
    output: &OutputArgs,
    run_config: &RunConfig,
) -> anyhow::Result<()> {
    println!("{}", run::landing_report(&prediction.summary));
    for (t, outcome) in &prediction.sweep {
        match outcome {
            Ok(summary) => println!(
                "cutdown {:.1} min: {:.4} {:.4} {:.1} after {:.1} min",
                seconds_to_minutes(*t),
                summary.landing.latitude,
                summary.landing.longitude,
                summary.landing.altitude,
                summary.minutes_to_impact(),
            ),
            Err(err) => println!("cutdown {:.1} min: {err}", seconds_to_minutes(*t)),
        }
    }

    let sinks = &run_config.output;
    if let Some(path) = output.track_csv.as_ref().or(sinks.track_csv.as_ref()) {
        run::write_track_csv(path, &prediction.track)?;
    }
    if let Some(path) = output.summary_json.as_ref().or(sinks.summary_json.as_ref()) {
        run::write_summary_json(path, prediction)?;
    }
    if let Some(path) = output.plot.as_ref().or(sinks.plot.as_ref()) {
        let track: Vec<TrackSample> = prediction
            .track
            .states()
            .map(|s| TrackSample {
                longitude: s.longitude,
                latitude: s.latitude,
                altitude: s.altitude,
            })
            .collect();
        plot::render_track_png(path, terrain.samples(), &track, (1000, 800))?;
    }
    Ok(())
}

fn load_config(output: &OutputArgs) -> anyhow::Result<RunConfig> {
    match &output.config {
        Some(path) => load_run_config(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn load_terrain(output: &OutputArgs, run_config: &RunConfig) -> anyhow::Result<TerrainGrid> {
    let lookup = output.lookup.map(TerrainLookupConfig::from);
    Ok(run::load_terrain(output.terrain.as_deref(), lookup, run_config)?)
}

fn resolve_launch(args: &LaunchArgs, input: &mut impl BufRead) -> anyhow::Result<Launch> {
    let (latitude, longitude, altitude) = match (args.lat, args.lon, args.alt) {
        (Some(lat), Some(lon), Some(alt)) => (lat, lon, alt),
        // clap only accepts the three together.
        _ => {
            let line = prompt(input, "Enter starting location (lat, lon, alt in m MSL): ")?;
            parse_location(&line)?
        }
    };
    let cutdown_s = match (args.cutdown_seconds, args.cutdown_minutes) {
        (Some(seconds), _) => seconds,
        (None, Some(minutes)) => minutes_to_seconds(minutes),
        (None, None) => {
            let line = prompt(input, "Enter expected time from launch to cutdown (minutes): ")?;
            let minutes: f64 = line
                .trim()
                .parse()
                .with_context(|| format!("invalid cutdown time '{}'", line.trim()))?;
            minutes_to_seconds(minutes)
        }
    };
    Ok(Launch {
        latitude,
        longitude,
        altitude,
        cutdown_s,
    })
}

fn parse_location(line: &str) -> anyhow::Result<(f64, f64, f64)> {
    let values = line
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid location '{}'", line.trim()))?;
    match values[..] {
        [lat, lon, alt] => Ok((lat, lon, alt)),
        _ => Err(anyhow!("expected 'lat, lon, alt', got '{}'", line.trim())),
    }
}

fn parse_valid_time(text: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{text}0000"), "%Y%m%d%H%M%S")
        .with_context(|| format!("invalid forecast time '{text}' (expected YYYYMMDDHH)"))
}

fn prompt(input: &mut impl BufRead, message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no input for prompt: {}", message.trim_end());
    }
    Ok(line.trim().to_string())
}
