//! Model sounding and tracker feed retrieval.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::info;

/// Base query endpoint for RAP point soundings.
pub const RAP_SOUNDINGS_URL: &str = "https://rucsoundings.noaa.gov/get_soundings.cgi";

/// Live tracker feed used when no feed file is given.
pub const DEFAULT_TRACKER_FEED_URL: &str = "http://kennedy.tw:8001/path/NSSL1313";

/// Length of the request window ending at the valid time (s).
const SOUNDING_WINDOW_S: i64 = 3_600;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Query URL for the RAP (Op40) sounding at a point, valid at `valid_time` (UTC).
pub fn rap_sounding_url(valid_time: NaiveDateTime, latitude: f64, longitude: f64) -> String {
    let end = valid_time.and_utc().timestamp();
    let start = end - SOUNDING_WINDOW_S;
    format!(
        "{RAP_SOUNDINGS_URL}?data_source=Op40&start_year={}&start_month_name={}&start_mday={}\
         &start_hour={}&start_min=0&n_hrs=1.0&fcst_len=shortest&airport={latitude}%2C{longitude}\
         &text=Ascii&startSecs={start}&endSecs={end}",
        valid_time.format("%Y"),
        valid_time.format("%b"),
        valid_time.format("%d"),
        valid_time.format("%H"),
    )
}

/// Download the RAP sounding text for a point.
pub fn fetch_rap_sounding(
    valid_time: NaiveDateTime,
    latitude: f64,
    longitude: f64,
) -> Result<String, ImportError> {
    fetch_text(&rap_sounding_url(valid_time, latitude, longitude))
}

/// Download a tracker KML feed.
pub fn fetch_tracker_feed(url: &str) -> Result<String, ImportError> {
    fetch_text(url)
}

/// Write fetched text to disk, creating parent directories.
pub fn save_text(path: &Path, body: &str) -> Result<(), ImportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    file.write_all(body.as_bytes())?;
    Ok(())
}

fn fetch_text(url: &str) -> Result<String, ImportError> {
    info!(url, "fetching");
    let client = Client::builder().build()?;
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.text()?)
}
