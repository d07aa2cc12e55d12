//! Drive the framing loop with a synthetic subject.
//!
//! The subject sits still at a fixed rectangle; each tick its detection is
//! displaced by uniform jitter, or dropped entirely with a given probability.

use std::path::PathBuf;

use camtrack_common::config::AppConfig;
use camtrack_common::CamtrackResult;
use camtrack_frame_model::crop::CropRecord;
use camtrack_frame_model::detection::{
    serialize_detection_frames, DetectionFrame, DetectionStreamHeader,
};
use camtrack_frame_model::rect::Rect;
use camtrack_framing_core::session::IterSource;
use camtrack_framing_core::{run_loop, CropSink, FramingSession};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimulateOptions {
    pub ticks: u64,
    pub seed: u64,
    pub subject: Rect,
    pub jitter: f64,
    pub dropout: f64,
    pub every: u64,
    /// Also write the synthesized detections here as a detection stream.
    pub record: Option<PathBuf>,
}

/// Parse `x,y,width,height` into a rectangle.
pub fn subject_rect(components: &[f64]) -> anyhow::Result<Rect> {
    let [x, y, width, height] = components else {
        anyhow::bail!("--subject takes exactly four values: x,y,width,height");
    };
    let rect = Rect::new(*x, *y, *width, *height);
    anyhow::ensure!(rect.is_valid(), "invalid subject rectangle {rect:?}");
    Ok(rect)
}

/// Synthesize `options.ticks` detection frames around the subject.
pub fn synthesize(options: &SimulateOptions) -> Vec<DetectionFrame> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let jitter = options.jitter;
    let base = options.subject;

    (0..options.ticks)
        .map(|t| {
            if rng.gen_bool(options.dropout) {
                return DetectionFrame::empty(t);
            }
            let dx = rng.gen_range(-jitter..=jitter);
            let dy = rng.gen_range(-jitter..=jitter);
            let grow = rng.gen_range(-jitter..=jitter);
            let side = |len: f64| (len + grow).max(1.0);
            let rect = Rect::new(
                base.x + dx,
                base.y + dy,
                side(base.width),
                side(base.height),
            );
            DetectionFrame::new(t, vec![rect])
        })
        .collect()
}

/// Render frames as a detection stream in scene coordinates, with a header
/// carrying the configured scene size.
pub fn detection_stream(
    config: &AppConfig,
    frames: &[DetectionFrame],
) -> serde_json::Result<String> {
    let header = DetectionStreamHeader {
        schema_version: "1.0".to_string(),
        scene_width: config.scene.width,
        scene_height: config.scene.height,
        pyramid_levels: 0,
    };
    serialize_detection_frames(Some(&header), frames)
}

/// Prints every Nth crop as a table row.
struct TableSink {
    every: u64,
}

impl CropSink for TableSink {
    fn present(&mut self, record: &CropRecord) -> CamtrackResult<()> {
        if record.frame % self.every == 0 {
            let c = &record.crop;
            println!(
                "{:>6}  {:>9.2} {:>9.2} {:>9.2} {:>9.2}  {}{}",
                record.frame,
                c.x,
                c.y,
                c.width,
                c.height,
                record.detections,
                if record.held { "  held" } else { "" }
            );
        }
        Ok(())
    }
}

pub fn run(config: &AppConfig, options: SimulateOptions) -> anyhow::Result<()> {
    anyhow::ensure!(
        options.jitter.is_finite() && options.jitter >= 0.0,
        "--jitter must be a non-negative number"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&options.dropout),
        "--dropout must be in [0.0, 1.0]"
    );
    anyhow::ensure!(options.every > 0, "--every must be at least 1");

    // Synthetic detections are already in scene coordinates.
    let mut config = config.clone();
    config.detector.pyramid_levels = 0;
    let mut session = FramingSession::from_config(&config)?;

    println!(
        "Simulating {} ticks, subject {:?}, jitter {}px, dropout {:.0}%",
        options.ticks,
        options.subject,
        options.jitter,
        options.dropout * 100.0
    );
    println!(
        "{:>6}  {:>9} {:>9} {:>9} {:>9}  det",
        "tick", "x", "y", "width", "height"
    );

    let frames = synthesize(&options);
    if let Some(path) = &options.record {
        std::fs::write(path, detection_stream(&config, &frames)?)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        tracing::info!(path = %path.display(), frames = frames.len(), "recorded detection stream");
    }
    let mut sink = TableSink {
        every: options.every,
    };
    let summary = run_loop(&mut session, &mut IterSource::new(frames), &mut sink)?;

    let (cx, cy) = session.controller().smoothed_center();
    let (sx, sy) = options.subject.center();
    println!();
    println!(
        "Ticks: {} ({} observed, {} held)",
        summary.ticks, summary.observed_ticks, summary.held_ticks
    );
    println!(
        "Smoothed center: ({cx:.2}, {cy:.2}), subject center: ({sx:.2}, {sy:.2})"
    );
    println!("Final crop: {:?}", session.last_crop());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camtrack_frame_model::detection::{parse_detection_frames, parse_stream_header};

    fn options() -> SimulateOptions {
        SimulateOptions {
            ticks: 200,
            seed: 42,
            subject: Rect::new(600.0, 400.0, 100.0, 100.0),
            jitter: 5.0,
            dropout: 0.25,
            every: 10,
            record: None,
        }
    }

    #[test]
    fn test_synthesize_is_deterministic_per_seed() {
        assert_eq!(synthesize(&options()), synthesize(&options()));
    }

    #[test]
    fn test_synthesized_detections_stay_within_jitter() {
        let opts = options();
        let frames = synthesize(&opts);
        assert_eq!(frames.len(), 200);
        assert!(frames.iter().any(|f| f.detections.is_empty()));
        for rect in frames.iter().flat_map(|f| &f.detections) {
            assert!((rect.x - 600.0).abs() <= 5.0);
            assert!((rect.y - 400.0).abs() <= 5.0);
            assert!((rect.width - 100.0).abs() <= 5.0);
        }
    }

    #[test]
    fn test_recorded_stream_reads_back_for_replay() {
        let config = AppConfig::default();
        let frames = synthesize(&options());
        let jsonl = detection_stream(&config, &frames).unwrap();

        let header = parse_stream_header(&jsonl).unwrap().unwrap();
        assert_eq!(header.scene_width, config.scene.width);
        assert_eq!(header.scene_height, config.scene.height);
        assert_eq!(header.pyramid_levels, 0);

        let parsed = parse_detection_frames(&jsonl).unwrap();
        assert_eq!(parsed.len(), frames.len());
        for (read, written) in parsed.iter().zip(&frames) {
            assert_eq!(read.frame, written.frame);
            assert_eq!(read.detections.len(), written.detections.len());
            for (a, b) in read.detections.iter().zip(&written.detections) {
                assert!((a.x - b.x).abs() < 1e-9 && (a.width - b.width).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_subject_rect_requires_four_values() {
        assert!(subject_rect(&[1.0, 2.0, 3.0]).is_err());
        assert!(subject_rect(&[0.0, 0.0, -1.0, 4.0]).is_err());
        assert_eq!(
            subject_rect(&[1.0, 2.0, 3.0, 4.0]).unwrap(),
            Rect::new(1.0, 2.0, 3.0, 4.0)
        );
    }
}
