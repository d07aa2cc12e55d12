//! CamTrack Frame Model
//!
//! Defines the data contracts exchanged with the outside world:
//! - **Rect:** Axis-aligned rectangles in scene pixel coordinates
//! - **Detections:** Per-frame detector output, recorded as JSONL
//! - **Crops:** Per-frame crop windows and their output transforms
//!
//! All coordinates are scene pixels with the origin at the top-left corner.

pub mod crop;
pub mod detection;
pub mod rect;

pub use crop::*;
pub use detection::*;
pub use rect::*;
