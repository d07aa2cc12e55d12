//! Clock and throughput utilities for the per-frame control loop.
//!
//! A session is anchored to a monotonic epoch taken when the loop starts.
//! This module provides utilities for:
//! - Capturing the epoch alongside its wall-clock time
//! - Measuring frames per second over fixed reporting intervals

use std::time::{Duration, Instant};

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the control loop started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get seconds elapsed since session start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Throughput measured over one reporting interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsReport {
    /// Frames counted in the interval.
    pub frames: u32,
    /// Length of the interval in seconds.
    pub interval_secs: f64,
}

impl FpsReport {
    /// Frames per second, truncated the way a frame counter displays it.
    pub fn fps(&self) -> u32 {
        if self.interval_secs <= 0.0 {
            return 0;
        }
        (self.frames as f64 / self.interval_secs) as u32
    }
}

/// Counts frames and emits a report once per interval.
#[derive(Debug)]
pub struct FpsMeter {
    interval: Duration,
    interval_start: Instant,
    frames: u32,
}

impl FpsMeter {
    /// Create a meter that reports every `interval`, starting now.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Create a meter whose first interval starts at `start`.
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            interval_start: start,
            frames: 0,
        }
    }

    /// Count one frame at the current time.
    pub fn frame(&mut self) -> Option<FpsReport> {
        self.frame_at(Instant::now())
    }

    /// Count one frame finished at `now`.
    /// Returns a report and restarts the interval once it has elapsed.
    pub fn frame_at(&mut self, now: Instant) -> Option<FpsReport> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let report = FpsReport {
            frames: self.frames,
            interval_secs: elapsed.as_secs_f64(),
        };
        self.frames = 0;
        self.interval_start = now;
        Some(report)
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
