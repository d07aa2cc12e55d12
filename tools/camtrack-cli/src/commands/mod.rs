pub mod config;
pub mod replay;
pub mod simulate;

use std::path::Path;

use camtrack_common::config::{AppConfig, TuningConfig};
use clap::Args;

/// Command-line overrides for the tuning section of the configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Low-pass weight of the newest target, in (0, 1]
    #[arg(long)]
    pub low_pass: Option<f64>,

    /// Center speed cap (pixels per tick)
    #[arg(long)]
    pub max_velocity: Option<f64>,

    /// Center acceleration cap (pixels per tick squared)
    #[arg(long)]
    pub max_acceleration: Option<f64>,

    /// Crop area as a multiple of the smoothed subject area
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Fraction of the crop height above the subject center [0.0, 1.0]
    #[arg(long)]
    pub bias: Option<f64>,
}

impl TuningArgs {
    /// Overwrite every tuning value given on the command line.
    pub fn apply(&self, tuning: &mut TuningConfig) {
        if let Some(alpha) = self.low_pass {
            tuning.low_pass_coefficient = alpha;
        }
        if let Some(v) = self.max_velocity {
            tuning.max_velocity = v;
        }
        if let Some(a) = self.max_acceleration {
            tuning.max_acceleration = a;
        }
        if let Some(zoom) = self.zoom {
            tuning.zoom_factor = zoom;
        }
        if let Some(bias) = self.bias {
            tuning.vertical_bias = bias;
        }
    }
}

/// Load the configuration from `path`, or from the default location.
///
/// An explicit path must exist unless `allow_missing` is set.
pub fn load_config(path: Option<&Path>, allow_missing: bool) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) if allow_missing && !path.exists() => Ok(AppConfig::default()),
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}")),
        None => Ok(AppConfig::load()),
    }
}
