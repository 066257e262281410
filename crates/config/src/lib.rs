//! Configuration models and loaders for prediction runs.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Run configuration: simulation overrides, terrain source, and output sinks.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub simulation: SimulationOverrides,
    #[serde(default)]
    pub terrain: Option<TerrainConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Optional replacements for the per-source simulation presets. Unset fields keep the preset.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SimulationOverrides {
    /// Constant ascent rate (m/s).
    #[serde(default)]
    pub rise_rate: Option<f64>,
    /// Ascent time step (s).
    #[serde(default)]
    pub ascent_interval: Option<f64>,
    /// Altitude lost per descent step (m).
    #[serde(default)]
    pub descent_interval: Option<f64>,
    #[serde(default)]
    pub k_nearest: Option<usize>,
    /// Altitude gap (m) beyond which GPS fixes are bridged.
    #[serde(default)]
    pub gap_threshold: Option<f64>,
    #[serde(default)]
    pub gps_available: Option<bool>,
    #[serde(default)]
    pub force_bracketing: Option<bool>,
    #[serde(default)]
    pub max_ascent_steps: Option<usize>,
    #[serde(default)]
    pub max_descent_steps: Option<usize>,
}

/// Terrain file and lookup strategy.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TerrainConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub lookup: TerrainLookupConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerrainLookupConfig {
    #[default]
    Nearest,
    AxisAligned,
}

/// Artifact destinations. `-` selects stdout for the tabular outputs.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub track_csv: Option<PathBuf>,
    #[serde(default)]
    pub summary_json: Option<PathBuf>,
    #[serde(default)]
    pub plot: Option<PathBuf>,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Load a run configuration. Files ending in `.toml` are read as TOML, anything else as YAML.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigError> {
    load_record(path)
}

fn load_record<T, P>(path: P) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}
