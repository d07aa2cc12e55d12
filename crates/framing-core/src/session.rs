//! Per-tick driving of the framing controller.
//!
//! A [`FramingSession`] turns one frame's raw detections into one crop
//! window: union, observe (or coast), crop. [`run_loop`] connects a
//! [`DetectionSource`] to a [`CropSink`] through a session.

use camtrack_common::clock::{FpsMeter, SessionClock};
use camtrack_common::config::AppConfig;
use camtrack_common::{CamtrackError, CamtrackResult};
use camtrack_frame_model::crop::CropRecord;
use camtrack_frame_model::detection::DetectionFrame;
use camtrack_frame_model::rect::{bounding_rect, Rect};

use crate::controller::FramingController;

/// Supplies detector output, one frame per call.
pub trait DetectionSource {
    /// The next frame's detections, or `None` when the stream has ended.
    fn next_frame(&mut self) -> CamtrackResult<Option<DetectionFrame>>;
}

/// Receives the crop window chosen for each frame.
pub trait CropSink {
    fn present(&mut self, record: &CropRecord) -> CamtrackResult<()>;
}

/// Adapts any iterator of frames into a [`DetectionSource`].
#[derive(Debug)]
pub struct IterSource<I> {
    frames: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = DetectionFrame>,
{
    pub fn new(frames: impl IntoIterator<IntoIter = I, Item = DetectionFrame>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I> DetectionSource for IterSource<I>
where
    I: Iterator<Item = DetectionFrame>,
{
    fn next_frame(&mut self) -> CamtrackResult<Option<DetectionFrame>> {
        Ok(self.frames.next())
    }
}

/// Collects every presented record in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<CropRecord>,
}

impl CropSink for VecSink {
    fn present(&mut self, record: &CropRecord) -> CamtrackResult<()> {
        self.records.push(*record);
        Ok(())
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Crop to render this tick.
    pub crop: Rect,
    /// True when `crop` was carried over because the new one was degenerate.
    pub held: bool,
    /// Scene-space bounding rectangle of this tick's detections.
    pub subject: Option<Rect>,
}

/// Counters accumulated over a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub ticks: u64,
    /// Ticks whose subject rectangle the controller accepted.
    pub observed_ticks: u64,
    /// Ticks that re-used the previous crop.
    pub held_ticks: u64,
}

/// Owns a controller and the last crop that was good enough to show.
#[derive(Debug, Clone)]
pub struct FramingSession {
    controller: FramingController,
    pyramid_levels: u32,
    last_crop: Rect,
    summary: RunSummary,
}

impl FramingSession {
    /// `pyramid_levels` is how many 2x downscales the detector ran at.
    pub fn new(controller: FramingController, pyramid_levels: u32) -> Self {
        let last_crop = controller.roi().unwrap_or_else(|_| controller.bounds());
        Self {
            controller,
            pyramid_levels,
            last_crop,
            summary: RunSummary::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> CamtrackResult<Self> {
        let controller = FramingController::from_config(config)?;
        Ok(Self::new(controller, config.detector.pyramid_levels))
    }

    /// Process one frame's detections (possibly none) and pick its crop.
    pub fn tick(&mut self, detections: &[Rect]) -> TickOutcome {
        self.summary.ticks += 1;

        let subject =
            bounding_rect(detections).map(|r| r.upscale_pyramid(self.pyramid_levels));
        // A rejected subject counts as a tick without detections.
        let accepted = subject.is_some_and(|rect| self.controller.observe(&rect));
        if accepted {
            self.summary.observed_ticks += 1;
        } else {
            self.controller.coast();
        }

        match self.controller.crop() {
            Ok(crop) => {
                self.last_crop = crop;
                TickOutcome {
                    crop,
                    held: false,
                    subject,
                }
            }
            Err(err) => {
                self.summary.held_ticks += 1;
                if err.is_per_tick() {
                    tracing::warn!(tick = self.summary.ticks, "holding previous crop: {err}");
                } else {
                    tracing::error!(tick = self.summary.ticks, "crop failed, holding previous: {err}");
                }
                TickOutcome {
                    crop: self.last_crop,
                    held: true,
                    subject,
                }
            }
        }
    }

    pub fn controller(&self) -> &FramingController {
        &self.controller
    }

    pub fn last_crop(&self) -> Rect {
        self.last_crop
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

/// Drive `source` into `sink` until the source runs dry.
///
/// Degenerate crops are held per tick; source and sink errors stop the loop.
pub fn run_loop<S, K>(
    session: &mut FramingSession,
    source: &mut S,
    sink: &mut K,
) -> CamtrackResult<RunSummary>
where
    S: DetectionSource + ?Sized,
    K: CropSink + ?Sized,
{
    let clock = SessionClock::start();
    let mut meter = FpsMeter::default();

    while let Some(frame) = source.next_frame()? {
        let outcome = session.tick(&frame.detections);
        let record = CropRecord {
            frame: frame.frame,
            crop: outcome.crop,
            held: outcome.held,
            detections: frame.detections.len(),
        };
        sink.present(&record).map_err(|e| match e {
            CamtrackError::Sink { .. } => e,
            other => CamtrackError::sink(other.to_string()),
        })?;

        if let Some(report) = meter.frame() {
            let roi = session.controller().roi().ok();
            tracing::info!(fps = report.fps(), ?roi, "framing throughput");
        }
    }

    let summary = session.summary();
    tracing::debug!(
        ?summary,
        started = clock.epoch_wall(),
        elapsed_secs = clock.elapsed_secs(),
        "detection source exhausted"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FramingParams, SlewLimits};

    fn session() -> FramingSession {
        let params = FramingParams {
            low_pass_coefficient: 0.3,
            center_slew: SlewLimits {
                max_velocity: 40.0,
                max_acceleration: 4.0,
            },
            ..Default::default()
        };
        let controller =
            FramingController::new(Rect::from_size(1440.0, 1080.0), 4.0 / 3.0, params).unwrap();
        FramingSession::new(controller, 0)
    }

    #[test]
    fn test_initial_crop_is_full_scene() {
        let session = session();
        let crop = session.last_crop();
        assert!((crop.width - 1440.0).abs() < 1e-9);
        assert!((crop.height - 1080.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tick_does_not_panic_and_counts() {
        let mut session = session();
        let outcome = session.tick(&[]);
        assert!(outcome.subject.is_none());
        assert!(!outcome.held);
        assert_eq!(
            session.summary(),
            RunSummary {
                ticks: 1,
                observed_ticks: 0,
                held_ticks: 0
            }
        );
    }

    #[test]
    fn test_tick_unions_multiple_detections() {
        let mut session = session();
        let outcome = session.tick(&[
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
        ]);
        assert_eq!(outcome.subject, Some(Rect::new(0.0, 0.0, 15.0, 15.0)));
        assert_eq!(
            session.controller().last_target(),
            Some(Rect::new(0.0, 0.0, 15.0, 15.0))
        );
    }

    #[test]
    fn test_pyramid_levels_scale_detections() {
        let controller =
            FramingController::new(Rect::from_size(1440.0, 1080.0), 4.0 / 3.0, FramingParams::default())
                .unwrap();
        let mut session = FramingSession::new(controller, 2);
        let outcome = session.tick(&[Rect::new(150.0, 100.0, 25.0, 25.0)]);
        assert_eq!(outcome.subject, Some(Rect::new(600.0, 400.0, 100.0, 100.0)));
    }

    #[test]
    fn test_degenerate_crop_holds_previous() {
        let params = FramingParams {
            low_pass_coefficient: 1.0,
            size_slew: None,
            ..Default::default()
        };
        let controller =
            FramingController::new(Rect::from_size(1440.0, 1080.0), 4.0 / 3.0, params).unwrap();
        let mut session = FramingSession::new(controller, 0);

        let first = session.tick(&[Rect::new(600.0, 400.0, 100.0, 100.0)]);
        assert!(!first.held);

        // A zero-area subject collapses the crop.
        let outcome = session.tick(&[Rect::new(650.0, 450.0, 0.0, 0.0)]);
        assert!(outcome.held);
        assert_eq!(outcome.crop, first.crop);
        assert_eq!(session.summary().held_ticks, 1);
    }

    #[test]
    fn test_rejected_subject_is_not_counted_as_observed() {
        let mut session = session();
        let outcome = session.tick(&[Rect::new(0.0, 0.0, 1e200, 1e200)]);
        assert!(outcome.subject.is_some());
        assert!(session.controller().last_target().is_none());
        assert_eq!(session.summary().observed_ticks, 0);

        session.tick(&[Rect::new(600.0, 400.0, 100.0, 100.0)]);
        assert_eq!(
            session.summary(),
            RunSummary {
                ticks: 2,
                observed_ticks: 1,
                held_ticks: 0
            }
        );
    }

    #[test]
    fn test_degenerate_start_holds_full_scene() {
        let scene = Rect::from_size(1440.0, 1080.0);
        let controller = FramingController::with_seed(
            scene,
            Rect::new(700.0, 500.0, 0.0, 0.0),
            4.0 / 3.0,
            FramingParams::default(),
        )
        .unwrap();
        assert!(controller.roi().is_err());
        let mut session = FramingSession::new(controller, 0);

        let outcome = session.tick(&[]);
        assert!(outcome.held);
        assert_eq!(outcome.crop, session.controller().bounds());
        assert_eq!(outcome.crop, scene);
        assert_eq!(session.summary().held_ticks, 1);
    }

    #[test]
    fn test_run_loop_presents_one_record_per_frame() {
        let mut session = session();
        let face = Rect::new(600.0, 400.0, 100.0, 100.0);
        let frames = (0..30u64).map(|t| {
            if t % 3 == 0 {
                DetectionFrame::empty(t)
            } else {
                DetectionFrame::new(t, vec![face])
            }
        });
        let mut source = IterSource::new(frames);
        let mut sink = VecSink::default();

        let summary = run_loop(&mut session, &mut source, &mut sink).unwrap();
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.observed_ticks, 20);
        assert_eq!(sink.records.len(), 30);
        assert_eq!(sink.records[4].frame, 4);
        assert_eq!(sink.records[3].detections, 0);
        assert_eq!(sink.records[4].detections, 1);
    }

    struct FailingSink;

    impl CropSink for FailingSink {
        fn present(&mut self, _record: &CropRecord) -> CamtrackResult<()> {
            Err(CamtrackError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            )))
        }
    }

    #[test]
    fn test_sink_failure_stops_loop() {
        let mut session = session();
        let mut source = IterSource::new(vec![DetectionFrame::empty(0), DetectionFrame::empty(1)]);
        let err = run_loop(&mut session, &mut source, &mut FailingSink).unwrap_err();
        assert!(matches!(err, CamtrackError::Sink { .. }));
        assert_eq!(session.summary().ticks, 1);
    }
}
