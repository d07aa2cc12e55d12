//! Axis-aligned rectangles in scene pixel coordinates.

use serde::{Deserialize, Serialize};

/// A rectangle given by its top-left corner and size.
///
/// Used for raw detections, the smoothed region of interest, and the crop
/// window handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin, e.g. a full scene.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Width over height. Undefined (NaN or infinite) for zero height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether all components are finite and the size is non-negative.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// [`is_valid`](Self::is_valid), and the derived edges, center and area
    /// are finite too. Huge but finite components can overflow these.
    pub fn has_finite_extent(&self) -> bool {
        let (cx, cy) = self.center();
        self.is_valid()
            && self.right().is_finite()
            && self.bottom().is_finite()
            && cx.is_finite()
            && cy.is_finite()
            && self.area().is_finite()
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether `other` lies inside `self`, allowing `tolerance` pixels of
    /// slack on every edge.
    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    /// Scale every component by `factor` (origin-anchored).
    pub fn scaled(&self, factor: f64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Map a rectangle found on an image downscaled `levels` times by 2
    /// back to full-resolution coordinates.
    pub fn upscale_pyramid(&self, levels: u32) -> Rect {
        self.scaled(f64::from(levels).exp2())
    }
}

/// Minimal rectangle enclosing every rectangle in `rects`.
///
/// Returns `None` when `rects` is empty; a frame without detections has no
/// bounding rectangle.
pub fn bounding_rect<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    let mut iter = rects.into_iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |acc, rect| acc.union(rect)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_union_of_overlapping_squares() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
        ];
        assert_eq!(bounding_rect(&rects), Some(Rect::new(0.0, 0.0, 15.0, 15.0)));
    }

    #[test]
    fn test_bounding_rect_of_nothing_is_none() {
        assert_eq!(bounding_rect(&[] as &[Rect]), None);
    }

    #[test]
    fn test_bounding_rect_single_is_identity() {
        let face = Rect::new(600.0, 400.0, 100.0, 100.0);
        assert_eq!(bounding_rect(&[face]), Some(face));
    }

    #[test]
    fn test_union_of_disjoint_rects() {
        let a = Rect::new(100.0, 50.0, 20.0, 30.0);
        let b = Rect::new(10.0, 200.0, 5.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(10.0, 50.0, 110.0, 155.0));
    }

    #[test]
    fn test_center_and_area() {
        let r = Rect::new(600.0, 400.0, 100.0, 50.0);
        assert_eq!(r.center(), (650.0, 425.0));
        assert_eq!(r.area(), 5000.0);
        assert_eq!(r.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_upscale_pyramid() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.upscale_pyramid(0), r);
        assert_eq!(r.upscale_pyramid(2), Rect::new(40.0, 80.0, 120.0, 160.0));
    }

    #[test]
    fn test_validity() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, -1.0, 4.0).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_finite_extent_rejects_overflowing_rects() {
        assert!(Rect::new(600.0, 400.0, 100.0, 100.0).has_finite_extent());
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).has_finite_extent());

        let huge = Rect::new(0.0, 0.0, 1e200, 1e200);
        assert!(huge.is_valid());
        assert!(!huge.has_finite_extent());

        let far_edge = Rect::new(1e308, 0.0, 1e308, 1.0);
        assert!(far_edge.is_valid());
        assert!(!far_edge.has_finite_extent());

        assert!(!Rect::new(0.0, 0.0, -1.0, 1.0).has_finite_extent());
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-500.0..500.0f64, -500.0..500.0f64, 0.0..300.0f64, 0.0..300.0f64)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn bounding_rect_contains_every_input(rects in prop::collection::vec(arb_rect(), 1..12)) {
            let bound = bounding_rect(&rects).unwrap();
            for rect in &rects {
                prop_assert!(bound.contains_rect(rect, 1e-9));
            }
        }

        #[test]
        fn bounding_rect_touches_extreme_edges(rects in prop::collection::vec(arb_rect(), 1..12)) {
            let bound = bounding_rect(&rects).unwrap();
            let min_x = rects.iter().map(|r| r.x).fold(f64::INFINITY, f64::min);
            let max_bottom = rects.iter().map(|r| r.bottom()).fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(bound.x, min_x);
            prop_assert!((bound.bottom() - max_bottom).abs() < 1e-9);
        }
    }
}
