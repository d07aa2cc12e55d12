//! Detection stream types.
//!
//! A detection stream is recorded in JSONL format: one [`DetectionFrame`] per
//! line, optionally preceded by a `# `-prefixed [`DetectionStreamHeader`].
//! Frames without detections are valid and common.

use serde::{Deserialize, Serialize};

use crate::rect::Rect;

/// Frame index within a detection stream.
pub type FrameIndex = u64;

/// Detector output for one captured frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Frame index since the start of the stream.
    #[serde(rename = "t")]
    pub frame: FrameIndex,

    /// Detected rectangles, in detector image coordinates.
    #[serde(default)]
    pub detections: Vec<Rect>,
}

/// Metadata describing a recorded detection stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Scene (full-resolution frame) dimensions in pixels.
    pub scene_width: u32,
    pub scene_height: u32,

    /// Number of 2x downscales the detector ran at.
    #[serde(default)]
    pub pyramid_levels: u32,
}

impl DetectionFrame {
    pub fn new(frame: FrameIndex, detections: Vec<Rect>) -> Self {
        Self { frame, detections }
    }

    /// A frame in which the detector found nothing.
    pub fn empty(frame: FrameIndex) -> Self {
        Self::new(frame, Vec::new())
    }
}

/// Errors raised while reading a detection stream.
#[derive(Debug, thiserror::Error)]
pub enum DetectionStreamError {
    #[error("Parse error on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Invalid detection on line {line}: {rect:?} (size must be finite and non-negative)")]
    InvalidDetection { line: usize, rect: Rect },
}

/// Parse detection frames from JSONL content.
///
/// Blank lines and `#` comment lines (including the header) are skipped.
/// Line numbers in errors are 1-based.
pub fn parse_detection_frames(jsonl: &str) -> Result<Vec<DetectionFrame>, DetectionStreamError> {
    jsonl
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            let frame: DetectionFrame =
                serde_json::from_str(line).map_err(|source| DetectionStreamError::Parse {
                    line: line_no,
                    source,
                })?;
            if let Some(rect) = frame.detections.iter().find(|r| !r.is_valid()) {
                return Err(DetectionStreamError::InvalidDetection {
                    line: line_no,
                    rect: *rect,
                });
            }
            Ok(frame)
        })
        .collect()
}

/// Read the `# `-prefixed header line, if the stream starts with one.
pub fn parse_stream_header(
    jsonl: &str,
) -> Option<Result<DetectionStreamHeader, DetectionStreamError>> {
    let first = jsonl.lines().map(str::trim).find(|l| !l.is_empty())?;
    let body = first.strip_prefix('#')?.trim();
    Some(
        serde_json::from_str(body)
            .map_err(|source| DetectionStreamError::Parse { line: 1, source }),
    )
}

/// Serialize detection frames to JSONL format, with an optional header line.
pub fn serialize_detection_frames(
    header: Option<&DetectionStreamHeader>,
    frames: &[DetectionFrame],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    if let Some(header) = header {
        output.push_str("# ");
        output.push_str(&serde_json::to_string(header)?);
        output.push('\n');
    }
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_without_detections_field_parses_empty() {
        let parsed = parse_detection_frames("{\"t\":7}").unwrap();
        assert_eq!(parsed, vec![DetectionFrame::empty(7)]);
    }

    #[test]
    fn test_jsonl_with_header_roundtrip() {
        let header = DetectionStreamHeader {
            schema_version: "1.0".to_string(),
            scene_width: 1440,
            scene_height: 1080,
            pyramid_levels: 1,
        };
        let frames = vec![
            DetectionFrame::new(0, vec![Rect::new(300.0, 200.0, 50.0, 50.0)]),
            DetectionFrame::empty(1),
        ];
        let jsonl = serialize_detection_frames(Some(&header), &frames).unwrap();

        assert!(jsonl.starts_with("# "));
        assert_eq!(parse_stream_header(&jsonl).unwrap().unwrap(), header);
        assert_eq!(parse_detection_frames(&jsonl).unwrap(), frames);
    }

    #[test]
    fn test_stream_without_header() {
        assert!(parse_stream_header("{\"t\":0}\n").is_none());
    }

    #[test]
    fn test_negative_detection_is_rejected_with_line_number() {
        let jsonl = "{\"t\":0}\n\n{\"t\":1,\"detections\":[{\"x\":0,\"y\":0,\"width\":-4,\"height\":4}]}\n";
        let err = parse_detection_frames(jsonl).unwrap_err();
        assert!(matches!(
            err,
            DetectionStreamError::InvalidDetection { line: 3, .. }
        ));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse_detection_frames("{\"t\":0}\nnot json\n").unwrap_err();
        assert!(matches!(err, DetectionStreamError::Parse { line: 2, .. }));
    }
}
