//! Weather balloon trajectory prediction.
//!
//! The engine lives in the workspace crates (profiles, terrain, geodesy and the flight
//! integrators); this crate wires them into the prediction pipeline shared by the
//! command-line front-ends and adds map rendering.

pub use balloon_config as config;
pub use balloon_export as export;
pub use balloon_flight as flight;
pub use balloon_geodesy as geodesy;
pub use balloon_importer as importer;
pub use balloon_sounding as sounding;
pub use balloon_terrain as terrain;

pub mod plot;
pub mod run;

/// Install the stderr log subscriber used by the binaries. `RUST_LOG` overrides the level.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
