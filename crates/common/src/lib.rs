//! CamTrack Common Utilities
//!
//! Shared infrastructure for all CamTrack crates:
//! - Error types and result aliases
//! - Tick clock and throughput measurement for the control loop
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
