//! Scalar smoothing stages and pipelines of stages.
//!
//! Each stage holds one value and moves it toward a target on every
//! `update`. Stages are chained into a [`Pipeline`], where the output of one
//! stage becomes the target of the next.

use camtrack_common::{CamtrackError, CamtrackResult};
use serde::{Deserialize, Serialize};

/// Parameters selecting and configuring one smoothing stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    /// Exponential moving average; `alpha` is the weight of the new target.
    LowPass { alpha: f64 },

    /// Motion with capped acceleration and capped speed.
    BoundedAccel {
        max_velocity: f64,
        max_acceleration: f64,
    },
}

impl StageSpec {
    /// Reject parameters that would make the stage diverge or stall.
    pub fn validate(&self) -> CamtrackResult<()> {
        match *self {
            StageSpec::LowPass { alpha } => {
                if !(alpha > 0.0 && alpha <= 1.0) {
                    return Err(CamtrackError::invalid_parameter(
                        "low_pass_coefficient",
                        format!("must be in (0, 1], got {alpha}"),
                    ));
                }
            }
            StageSpec::BoundedAccel {
                max_velocity,
                max_acceleration,
            } => {
                if !(max_velocity > 0.0 && max_velocity.is_finite()) {
                    return Err(CamtrackError::invalid_parameter(
                        "max_velocity",
                        format!("must be positive and finite, got {max_velocity}"),
                    ));
                }
                if !(max_acceleration > 0.0 && max_acceleration.is_finite()) {
                    return Err(CamtrackError::invalid_parameter(
                        "max_acceleration",
                        format!("must be positive and finite, got {max_acceleration}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Exponential moving average toward the target.
#[derive(Debug, Clone, PartialEq)]
pub struct LowPass {
    alpha: f64,
    value: f64,
}

impl LowPass {
    /// `alpha` in (0, 1]: near 1 tracks the target almost immediately,
    /// near 0 barely moves.
    pub fn new(alpha: f64, initial: f64) -> CamtrackResult<Self> {
        StageSpec::LowPass { alpha }.validate()?;
        Ok(Self {
            alpha,
            value: initial,
        })
    }

    pub fn update(&mut self, target: f64) -> f64 {
        self.value = self.value * (1.0 - self.alpha) + target * self.alpha;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Actuator model with bounded acceleration and bounded speed.
///
/// Ramps up toward the target and brakes exactly onto it: the final step may
/// be shorter than the acceleration or speed caps would allow, but the value
/// never passes the target.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedAccel {
    max_velocity: f64,
    max_acceleration: f64,
    value: f64,
    velocity: f64,
}

impl BoundedAccel {
    /// Start at rest at `initial`.
    pub fn new(max_velocity: f64, max_acceleration: f64, initial: f64) -> CamtrackResult<Self> {
        StageSpec::BoundedAccel {
            max_velocity,
            max_acceleration,
        }
        .validate()?;
        Ok(Self {
            max_velocity,
            max_acceleration,
            value: initial,
            velocity: 0.0,
        })
    }

    /// Step toward `target`. When the value already equals `target` the
    /// velocity resets to zero, so coasting onto a reached target stays put.
    pub fn update(&mut self, target: f64) -> f64 {
        if target < self.value {
            self.velocity = (self.velocity - self.max_acceleration).max(-self.max_velocity);
            if self.value + self.velocity <= target {
                self.brake_onto(target);
            } else {
                self.value += self.velocity;
            }
            debug_assert!(self.value >= target);
        } else if target > self.value {
            self.velocity = (self.velocity + self.max_acceleration).min(self.max_velocity);
            if self.value + self.velocity >= target {
                self.brake_onto(target);
            } else {
                self.value += self.velocity;
            }
            debug_assert!(self.value <= target);
        } else {
            // At rest on the target.
            self.velocity = 0.0;
        }
        self.value
    }

    /// Final step: land exactly on `target`. `value + (target - value)` can
    /// round past `target`, so the value is assigned rather than summed.
    fn brake_onto(&mut self, target: f64) {
        self.velocity = target - self.value;
        self.value = target;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Signed step taken by the last update.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }
}

/// One smoothing stage: a closed set of filters sharing `update`/`value`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarSmoother {
    LowPass(LowPass),
    BoundedAccel(BoundedAccel),
}

impl ScalarSmoother {
    /// Build a stage from its spec, starting at `initial`.
    pub fn from_spec(spec: StageSpec, initial: f64) -> CamtrackResult<Self> {
        Ok(match spec {
            StageSpec::LowPass { alpha } => Self::LowPass(LowPass::new(alpha, initial)?),
            StageSpec::BoundedAccel {
                max_velocity,
                max_acceleration,
            } => Self::BoundedAccel(BoundedAccel::new(
                max_velocity,
                max_acceleration,
                initial,
            )?),
        })
    }

    /// Move toward `target` and return the new value.
    pub fn update(&mut self, target: f64) -> f64 {
        match self {
            Self::LowPass(stage) => stage.update(target),
            Self::BoundedAccel(stage) => stage.update(target),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::LowPass(stage) => stage.value(),
            Self::BoundedAccel(stage) => stage.value(),
        }
    }

    /// Current velocity; low-pass stages carry none.
    pub fn velocity(&self) -> f64 {
        match self {
            Self::LowPass(_) => 0.0,
            Self::BoundedAccel(stage) => stage.velocity(),
        }
    }

    pub fn spec(&self) -> StageSpec {
        match self {
            Self::LowPass(stage) => StageSpec::LowPass {
                alpha: stage.alpha(),
            },
            Self::BoundedAccel(stage) => StageSpec::BoundedAccel {
                max_velocity: stage.max_velocity(),
                max_acceleration: stage.max_acceleration(),
            },
        }
    }

    /// Apply new parameters, keeping value (and velocity when the variant
    /// is unchanged).
    pub fn retune(&mut self, spec: StageSpec) -> CamtrackResult<()> {
        spec.validate()?;
        match (self, spec) {
            (Self::LowPass(stage), StageSpec::LowPass { alpha }) => {
                stage.alpha = alpha;
            }
            (
                Self::BoundedAccel(stage),
                StageSpec::BoundedAccel {
                    max_velocity,
                    max_acceleration,
                },
            ) => {
                stage.max_velocity = max_velocity;
                stage.max_acceleration = max_acceleration;
                stage.velocity = stage.velocity.clamp(-max_velocity, max_velocity);
            }
            (this, spec) => {
                *this = Self::from_spec(spec, this.value())?;
            }
        }
        Ok(())
    }
}

/// An ordered chain of stages. Each update feeds the target into the first
/// stage and every stage's new value into the next; the pipeline's value is
/// the last stage's value.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    head: ScalarSmoother,
    tail: Vec<ScalarSmoother>,
}

impl Pipeline {
    pub fn new(first: ScalarSmoother) -> Self {
        Self {
            head: first,
            tail: Vec::new(),
        }
    }

    /// Append a stage fed by the current last stage.
    pub fn then(mut self, stage: ScalarSmoother) -> Self {
        self.tail.push(stage);
        self
    }

    /// Two-stage composition: `first` shapes the target, `second` follows it.
    pub fn composed(first: ScalarSmoother, second: ScalarSmoother) -> Self {
        Self::new(first).then(second)
    }

    /// Build a pipeline with every stage starting at `initial`.
    pub fn from_specs(specs: &[StageSpec], initial: f64) -> CamtrackResult<Self> {
        let (first, rest) = specs
            .split_first()
            .ok_or_else(|| CamtrackError::config("a smoothing pipeline needs at least one stage"))?;
        let mut pipeline = Self::new(ScalarSmoother::from_spec(*first, initial)?);
        for spec in rest {
            pipeline = pipeline.then(ScalarSmoother::from_spec(*spec, initial)?);
        }
        Ok(pipeline)
    }

    pub fn update(&mut self, target: f64) -> f64 {
        let mut value = self.head.update(target);
        for stage in &mut self.tail {
            value = stage.update(value);
        }
        value
    }

    pub fn value(&self) -> f64 {
        self.tail.last().unwrap_or(&self.head).value()
    }

    pub fn stages(&self) -> impl Iterator<Item = &ScalarSmoother> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Always false; a pipeline has at least one stage.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Apply new stage parameters.
    ///
    /// With the same number of stages each stage is retuned in place.
    /// Otherwise the pipeline is rebuilt with every stage starting from the
    /// current output, so the smoothed value does not jump.
    pub fn retune(&mut self, specs: &[StageSpec]) -> CamtrackResult<()> {
        for spec in specs {
            spec.validate()?;
        }
        if specs.len() == self.len() {
            self.head.retune(specs[0])?;
            for (stage, spec) in self.tail.iter_mut().zip(&specs[1..]) {
                stage.retune(*spec)?;
            }
        } else {
            *self = Self::from_specs(specs, self.value())?;
        }
        Ok(())
    }
}
