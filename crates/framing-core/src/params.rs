//! Validated framing parameters.

use camtrack_common::config::TuningConfig;
use camtrack_common::{CamtrackError, CamtrackResult};
use serde::{Deserialize, Serialize};

use crate::smoother::StageSpec;

/// Speed and acceleration caps for a bounded-acceleration stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlewLimits {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// The plain parameter set the framing controller runs with.
///
/// Center pipelines are bounded-acceleration followed by low-pass. The size
/// pipeline uses the same low-pass coefficient, preceded by a
/// bounded-acceleration stage in area units when `size_slew` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingParams {
    pub low_pass_coefficient: f64,
    pub center_slew: SlewLimits,
    pub size_slew: Option<SlewLimits>,
    pub zoom_factor: f64,
    pub vertical_bias: f64,
}

impl FramingParams {
    /// Check every field; nothing is clamped.
    pub fn validate(&self) -> CamtrackResult<()> {
        for spec in self.center_stages().iter().chain(self.size_stages().iter()) {
            spec.validate()?;
        }
        validate_zoom(self.zoom_factor)?;
        validate_bias(self.vertical_bias)?;
        Ok(())
    }

    /// Stages for the center-x and center-y pipelines.
    pub fn center_stages(&self) -> Vec<StageSpec> {
        vec![
            StageSpec::BoundedAccel {
                max_velocity: self.center_slew.max_velocity,
                max_acceleration: self.center_slew.max_acceleration,
            },
            StageSpec::LowPass {
                alpha: self.low_pass_coefficient,
            },
        ]
    }

    /// Stages for the size pipeline.
    pub fn size_stages(&self) -> Vec<StageSpec> {
        let low_pass = StageSpec::LowPass {
            alpha: self.low_pass_coefficient,
        };
        match self.size_slew {
            Some(limits) => vec![
                StageSpec::BoundedAccel {
                    max_velocity: limits.max_velocity,
                    max_acceleration: limits.max_acceleration,
                },
                low_pass,
            ],
            None => vec![low_pass],
        }
    }
}

impl TryFrom<&TuningConfig> for FramingParams {
    type Error = CamtrackError;

    fn try_from(tuning: &TuningConfig) -> CamtrackResult<Self> {
        let size_slew = match (tuning.size_max_velocity, tuning.size_max_acceleration) {
            (Some(max_velocity), Some(max_acceleration)) => Some(SlewLimits {
                max_velocity,
                max_acceleration,
            }),
            (None, None) => None,
            _ => {
                return Err(CamtrackError::config(
                    "size_max_velocity and size_max_acceleration must be set together",
                ))
            }
        };

        let params = Self {
            low_pass_coefficient: tuning.low_pass_coefficient,
            center_slew: SlewLimits {
                max_velocity: tuning.max_velocity,
                max_acceleration: tuning.max_acceleration,
            },
            size_slew,
            zoom_factor: tuning.zoom_factor,
            vertical_bias: tuning.vertical_bias,
        };
        params.validate()?;
        Ok(params)
    }
}

impl Default for FramingParams {
    fn default() -> Self {
        let tuning = TuningConfig::default();
        Self {
            low_pass_coefficient: tuning.low_pass_coefficient,
            center_slew: SlewLimits {
                max_velocity: tuning.max_velocity,
                max_acceleration: tuning.max_acceleration,
            },
            size_slew: tuning
                .size_max_velocity
                .zip(tuning.size_max_acceleration)
                .map(|(max_velocity, max_acceleration)| SlewLimits {
                    max_velocity,
                    max_acceleration,
                }),
            zoom_factor: tuning.zoom_factor,
            vertical_bias: tuning.vertical_bias,
        }
    }
}

pub(crate) fn validate_zoom(zoom_factor: f64) -> CamtrackResult<()> {
    if !(zoom_factor > 0.0 && zoom_factor.is_finite()) {
        return Err(CamtrackError::invalid_parameter(
            "zoom_factor",
            format!("must be positive and finite, got {zoom_factor}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_bias(vertical_bias: f64) -> CamtrackResult<()> {
    if !(0.0..=1.0).contains(&vertical_bias) {
        return Err(CamtrackError::invalid_parameter(
            "vertical_bias",
            format!("must be in [0, 1], got {vertical_bias}"),
        ));
    }
    Ok(())
}
