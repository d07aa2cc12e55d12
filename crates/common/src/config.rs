//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CamtrackError, CamtrackResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scene (camera frame) dimensions.
    pub scene: SceneConfig,

    /// Output frame dimensions; these fix the crop aspect ratio.
    pub output: OutputConfig,

    /// Smoothing and framing parameters.
    pub tuning: TuningConfig,

    /// Detector-side parameters that affect how detections are interpreted.
    pub detector: DetectorConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Scene dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
}

/// Output frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
}

/// Tunable framing parameters.
///
/// Values are taken as-is; validation happens when a controller is built
/// from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Low-pass weight of the newest target, in (0, 1].
    pub low_pass_coefficient: f64,

    /// Center speed cap (pixels per tick).
    pub max_velocity: f64,

    /// Center acceleration cap (pixels per tick squared).
    pub max_acceleration: f64,

    /// Area multiplier applied to the smoothed subject size.
    /// Values above 1 frame more context around the subject.
    pub zoom_factor: f64,

    /// Fraction of the crop height placed above the tracked center, in [0, 1].
    pub vertical_bias: f64,

    /// Size speed cap (square pixels per tick). When unset the size
    /// pipeline is a single low-pass stage.
    pub size_max_velocity: Option<f64>,

    /// Size acceleration cap (square pixels per tick squared).
    pub size_max_acceleration: Option<f64>,
}

/// Detector-side parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of 2x pyramid downscales applied before detection.
    /// Detections are scaled back up by `2^pyramid_levels`.
    pub pyramid_levels: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "camtrack=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            output: OutputConfig::default(),
            tuning: TuningConfig::default(),
            detector: DetectorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 1080,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl OutputConfig {
    /// Width over height of the output frame.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            low_pass_coefficient: 0.01,
            max_velocity: 1.0,
            max_acceleration: 0.075,
            zoom_factor: 6.0,
            vertical_bias: 40.0 / 120.0,
            size_max_velocity: None,
            size_max_acceleration: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing files and parse errors
    /// are reported rather than replaced with defaults.
    pub fn load_from(path: impl AsRef<Path>) -> CamtrackResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CamtrackError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            CamtrackError::config(format!("invalid config at {}: {e}", path.display()))
        })
    }

    /// Save config to the standard location.
    pub fn save(&self) -> CamtrackResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> CamtrackResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("camtrack").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_aspect_is_four_by_three() {
        let config = AppConfig::default();
        assert!((config.output.aspect_ratio() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "tuning": { "zoom_factor": 3.5 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.tuning.zoom_factor, 3.5);
        assert_eq!(
            config.tuning.low_pass_coefficient,
            TuningConfig::default().low_pass_coefficient
        );
        assert_eq!(config.scene, SceneConfig::default());
    }

    #[test]
    fn test_size_caps_default_off_and_parse() {
        assert!(TuningConfig::default().size_max_velocity.is_none());

        let raw = r#"{ "tuning": { "size_max_velocity": 50000, "size_max_acceleration": 5000 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.tuning.size_max_velocity, Some(50_000.0));
        assert_eq!(config.tuning.size_max_acceleration, Some(5_000.0));

        let raw = r#"{ "tuning": { "size_max_velocity": null, "size_max_acceleration": null } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert!(config.tuning.size_max_velocity.is_none());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = std::env::temp_dir().join(format!("camtrack-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.tuning.vertical_bias = 0.25;
        config.detector.pyramid_levels = 2;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_missing_path_is_an_error() {
        let err = AppConfig::load_from("/nonexistent/camtrack/config.json").unwrap_err();
        assert!(matches!(err, CamtrackError::FileNotFound { .. }));
    }
}
