//! CamTrack Framing Core
//!
//! Turns noisy, intermittent subject detections into a smoothly moving,
//! aspect-locked crop window:
//! - **Smoothers:** low-pass and bounded-acceleration stages, chained into pipelines
//! - **Controller:** smoothed center and size, zoom and vertical bias, scene clamping
//! - **Session:** per-tick union/observe/crop with hold-on-degenerate, and the
//!   loop connecting a detection source to a crop sink
//!
//! This crate is pure computation apart from the collaborator traits.
//! All inputs are data; all outputs are data.

pub mod controller;
pub mod params;
pub mod session;
pub mod smoother;

pub use controller::FramingController;
pub use params::{FramingParams, SlewLimits};
pub use session::{run_loop, CropSink, DetectionSource, FramingSession, RunSummary};
pub use smoother::{BoundedAccel, LowPass, Pipeline, ScalarSmoother, StageSpec};
