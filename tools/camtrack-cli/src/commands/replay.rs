//! Replay a recorded detection stream through the framing loop.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use camtrack_common::config::AppConfig;
use camtrack_common::{CamtrackError, CamtrackResult};
use camtrack_frame_model::crop::{AffineTransform, CropRecord};
use camtrack_frame_model::detection::{parse_detection_frames, parse_stream_header};
use camtrack_framing_core::session::IterSource;
use camtrack_framing_core::{run_loop, CropSink, FramingSession};
use serde::Serialize;

/// One output line: the crop record, plus the renderer transform on request.
#[derive(Serialize)]
struct CropLine<'a> {
    #[serde(flatten)]
    record: &'a CropRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<AffineTransform>,
}

/// Writes crop records as JSONL.
pub struct JsonlSink<W: Write> {
    writer: W,
    /// Output frame size, when transforms are requested.
    output_size: Option<(u32, u32)>,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W, output_size: Option<(u32, u32)>) -> Self {
        Self {
            writer,
            output_size,
        }
    }

    pub fn finish(mut self) -> std::io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> CropSink for JsonlSink<W> {
    fn present(&mut self, record: &CropRecord) -> CamtrackResult<()> {
        let transform = self
            .output_size
            .and_then(|(w, h)| AffineTransform::crop_to_output(&record.crop, w, h));
        let line = CropLine { record, transform };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    transform: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;

    let mut config = config.clone();
    if let Some(header) = parse_stream_header(&content) {
        let header =
            header.map_err(|e| anyhow::anyhow!("Invalid detection stream header: {e}"))?;
        tracing::debug!(?header, "using scene geometry from stream header");
        config.scene.width = header.scene_width;
        config.scene.height = header.scene_height;
        config.detector.pyramid_levels = header.pyramid_levels;
    }

    let frames = parse_detection_frames(&content)
        .map_err(|e| CamtrackError::detection(format!("{}: {e}", path.display())))?;
    tracing::info!(frames = frames.len(), path = %path.display(), "replaying detection stream");

    let mut session = FramingSession::from_config(&config)?;
    let output_size = transform.then_some((config.output.width, config.output.height));

    let writer: Box<dyn Write> = match &output {
        Some(out) => Box::new(BufWriter::new(File::create(out).map_err(|e| {
            anyhow::anyhow!("Failed to create {}: {e}", out.display())
        })?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut sink = JsonlSink::new(writer, output_size);

    let summary = run_loop(&mut session, &mut IterSource::new(frames), &mut sink)?;
    sink.finish()?;

    eprintln!(
        "Replayed {} frames ({} observed, {} held)",
        summary.ticks, summary.observed_ticks, summary.held_ticks
    );
    if let Some(out) = output {
        eprintln!("Crop records written to: {}", out.display());
    }
    Ok(())
}
