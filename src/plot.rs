//! Map rendering: terrain squares coloured by elevation with the predicted track on top.

use std::fs;
use std::path::Path;

use balloon_terrain::TerrainSample;
use csv::ReaderBuilder;
use plotters::prelude::*;
use thiserror::Error;
use tracing::warn;

/// Elevation range mapped onto the terrain colour scale (m).
pub const TERRAIN_COLOR_RANGE_M: (f64, f64) = (0.0, 700.0);

/// Margin around the track bounding box (deg).
const VIEW_MARGIN_DEG: f64 = 0.1;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("track CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("track CSV missing '{0}' column")]
    MissingColumn(&'static str),
    #[error("track contains no points")]
    EmptyTrack,
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output path contains invalid UTF-8")]
    InvalidPath,
    #[error("drawing failed: {0}")]
    Draw(String),
}

/// Position read back from a track CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

/// Read longitude, latitude and altitude columns from an exported track.
pub fn read_track_csv(path: &Path) -> Result<Vec<TrackSample>, PlotError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(PlotError::MissingColumn(name))
    };
    let lon_idx = column("longitude_deg")?;
    let lat_idx = column("latitude_deg")?;
    let alt_idx = column("altitude_m")?;

    let mut samples = Vec::new();
    for rec in rdr.records() {
        let r = rec?;
        let value = |idx: usize| r.get(idx).unwrap_or("").parse().unwrap_or(f64::NAN);
        let sample = TrackSample {
            longitude: value(lon_idx),
            latitude: value(lat_idx),
            altitude: value(alt_idx),
        };
        if sample.longitude.is_finite() && sample.latitude.is_finite() && sample.altitude.is_finite() {
            samples.push(sample);
        }
    }
    Ok(samples)
}

/// Render the terrain around the track and the track itself to a PNG.
pub fn render_track_png(
    output: &Path,
    terrain: &[TerrainSample],
    track: &[TrackSample],
    (width, height): (u32, u32),
) -> Result<(), PlotError> {
    if track.is_empty() {
        return Err(PlotError::EmptyTrack);
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output_str = output.to_str().ok_or(PlotError::InvalidPath)?;

    let (lon_min, lon_max) = bounds(track.iter().map(|s| s.longitude));
    let (lat_min, lat_max) = bounds(track.iter().map(|s| s.latitude));
    let x_range = (lon_min - VIEW_MARGIN_DEG)..(lon_max + VIEW_MARGIN_DEG);
    let y_range = (lat_min - VIEW_MARGIN_DEG)..(lat_max + VIEW_MARGIN_DEG);

    let root = BitMapBackend::new(output_str, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_err)?;

    // Labels need a system font; without one the map is still worth writing.
    if let Err(err) = chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .label_style(FontDesc::new(select_font_family(), 14.0, FontStyle::Normal))
        .draw()
    {
        warn!("axis labels skipped: {err}");
    }

    let visible: Vec<&TerrainSample> = terrain
        .iter()
        .filter(|s| x_range.contains(&s.longitude) && y_range.contains(&s.latitude))
        .collect();
    let lons = sorted_unique(visible.iter().map(|s| s.longitude));
    let lats = sorted_unique(visible.iter().map(|s| s.latitude));
    let (lo, hi) = TERRAIN_COLOR_RANGE_M;
    chart
        .draw_series(visible.iter().filter_map(|s| {
            let (x0, x1) = cell_bounds(&lons, lons.binary_search_by(|v| v.total_cmp(&s.longitude)).ok()?);
            let (y0, y1) = cell_bounds(&lats, lats.binary_search_by(|v| v.total_cmp(&s.latitude)).ok()?);
            let color = terrain_color((s.elevation - lo) / (hi - lo));
            Some(Rectangle::new([(x0, y0), (x1, y1)], color.filled()))
        }))
        .map_err(draw_err)?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            track.iter().map(|s| (s.longitude, s.latitude)).collect::<Vec<_>>(),
            ShapeStyle::from(&BLACK.mix(0.6)).stroke_width(1),
        )))
        .map_err(draw_err)?;

    let (alt_min, alt_max) = bounds(track.iter().map(|s| s.altitude));
    let span = (alt_max - alt_min).max(f64::EPSILON);
    chart
        .draw_series(track.iter().map(|s| {
            let color = jet_color((s.altitude - alt_min) / span);
            Circle::new((s.longitude, s.latitude), 2, color.filled())
        }))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Blue-to-red colour scale for `t` in [0, 1].
pub fn jet_color(t_in: f64) -> RGBColor {
    let t = t_in.clamp(0.0, 1.0);
    fn comp(v: f64) -> f64 {
        (1.0 - (v - 1.0).abs()).clamp(0.0, 1.0)
    }
    let r = comp(1.5 - 4.0 * (t - 0.75).abs());
    let g = comp(1.5 - 4.0 * (t - 0.5).abs());
    let b = comp(1.5 - 4.0 * (t - 0.25).abs());
    RGBColor((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Green lowlands through brown to white peaks.
fn terrain_color(t_in: f64) -> RGBColor {
    let t = t_in.clamp(0.0, 1.0);
    let stops = [(0.0, (40.0, 120.0, 60.0)), (0.6, (150.0, 110.0, 60.0)), (1.0, (245.0, 245.0, 245.0))];
    let (mut lower, mut upper) = (stops[0], stops[stops.len() - 1]);
    for pair in stops.windows(2) {
        if t >= pair[0].0 && t <= pair[1].0 {
            (lower, upper) = (pair[0], pair[1]);
            break;
        }
    }
    let f = if upper.0 > lower.0 { (t - lower.0) / (upper.0 - lower.0) } else { 0.0 };
    let mix = |a: f64, b: f64| (a + f * (b - a)) as u8;
    RGBColor(
        mix(lower.1.0, upper.1.0),
        mix(lower.1.1, upper.1.1),
        mix(lower.1.2, upper.1.2),
    )
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Draw(err.to_string())
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Extent of the cell centred on `coords[idx]`, halfway to its neighbours.
fn cell_bounds(coords: &[f64], idx: usize) -> (f64, f64) {
    let center = coords[idx];
    let prev = idx.checked_sub(1).and_then(|i| coords.get(i)).copied();
    let next = coords.get(idx + 1).copied();

    let left = match (prev, next) {
        (Some(prev), _) => 0.5 * (prev + center),
        (None, Some(next)) => center - 0.5 * (next - center),
        (None, None) => center - 0.005,
    };

    let right = match (prev, next) {
        (_, Some(next)) => 0.5 * (center + next),
        (Some(prev), None) => center + 0.5 * (center - prev),
        (None, None) => center + 0.005,
    };

    (left, right)
}
