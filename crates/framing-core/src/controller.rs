//! The framing controller: smoothed region of interest and crop solving.
//!
//! # Algorithm
//!
//! 1. **Observe:** each detection's center and area feed three independent
//!    pipelines (center-x, center-y, size).
//! 2. **Size:** the smoothed area times the zoom factor gives the crop area;
//!    the fixed aspect ratio turns that into width and height.
//! 3. **Place:** the crop is centered horizontally on the smoothed center and
//!    positioned vertically so `vertical_bias` of its height lies above it.
//! 4. **Clamp:** each edge outside the scene (left, top, right, bottom, in
//!    that order) shrinks the crop about its center, keeping the aspect ratio.

use camtrack_common::config::AppConfig;
use camtrack_common::{CamtrackError, CamtrackResult};
use camtrack_frame_model::rect::Rect;

use crate::params::{validate_bias, validate_zoom, FramingParams};
use crate::smoother::Pipeline;

/// Smooths observed subject rectangles into an aspect-locked crop window.
#[derive(Debug, Clone)]
pub struct FramingController {
    bounds: Rect,
    aspect: f64,
    params: FramingParams,
    center_x: Pipeline,
    center_y: Pipeline,
    size: Pipeline,
    last_target: Option<Rect>,
}

impl FramingController {
    /// Controller seeded with the full scene.
    pub fn new(bounds: Rect, aspect: f64, params: FramingParams) -> CamtrackResult<Self> {
        Self::with_seed(bounds, bounds, aspect, params)
    }

    /// Controller whose smoothed state starts at `seed`.
    pub fn with_seed(
        bounds: Rect,
        seed: Rect,
        aspect: f64,
        params: FramingParams,
    ) -> CamtrackResult<Self> {
        if !(bounds.is_valid() && bounds.width > 0.0 && bounds.height > 0.0) {
            return Err(CamtrackError::invalid_parameter(
                "scene",
                format!("bounds must have positive finite size, got {bounds:?}"),
            ));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(CamtrackError::invalid_parameter(
                "aspect",
                format!("must be positive and finite, got {aspect}"),
            ));
        }
        if !seed.is_valid() {
            return Err(CamtrackError::invalid_parameter(
                "seed",
                format!("must be finite with non-negative size, got {seed:?}"),
            ));
        }
        params.validate()?;

        let (cx, cy) = seed.center();
        Ok(Self {
            bounds,
            aspect,
            params,
            center_x: Pipeline::from_specs(&params.center_stages(), cx)?,
            center_y: Pipeline::from_specs(&params.center_stages(), cy)?,
            size: Pipeline::from_specs(&params.size_stages(), seed.area())?,
            last_target: None,
        })
    }

    /// Controller for the configured scene, output aspect and tuning.
    pub fn from_config(config: &AppConfig) -> CamtrackResult<Self> {
        let bounds = Rect::from_size(
            f64::from(config.scene.width),
            f64::from(config.scene.height),
        );
        let params = FramingParams::try_from(&config.tuning)?;
        Self::new(bounds, config.output.aspect_ratio(), params)
    }

    /// Feed this tick's subject rectangle into the smoothing pipelines.
    ///
    /// Rectangles with negative size, or whose components, edges, center or
    /// area are not finite, are ignored. Returns whether `target` was taken.
    pub fn observe(&mut self, target: &Rect) -> bool {
        if !target.has_finite_extent() {
            tracing::warn!(?target, "ignoring invalid subject rectangle");
            return false;
        }
        self.feed(target);
        self.last_target = Some(*target);
        true
    }

    /// Advance one tick without a new observation.
    ///
    /// Pipelines keep moving toward the last observed target, so motion in
    /// flight settles instead of freezing. Before the first observation this
    /// does nothing.
    pub fn coast(&mut self) {
        if let Some(target) = self.last_target {
            self.feed(&target);
        }
    }

    fn feed(&mut self, target: &Rect) {
        let (cx, cy) = target.center();
        self.center_x.update(cx);
        self.center_y.update(cy);
        self.size.update(target.area());
        tracing::trace!(
            cx = self.center_x.value(),
            cy = self.center_y.value(),
            size = self.size.value(),
            "smoothed state"
        );
    }

    /// Crop window for the current smoothed state.
    ///
    /// Returns [`CamtrackError::DegenerateCrop`] when clamping leaves no
    /// positive area; callers should keep their previous frame.
    pub fn current_crop(&self, zoom_factor: f64, vertical_bias: f64) -> CamtrackResult<Rect> {
        validate_zoom(zoom_factor)?;
        validate_bias(vertical_bias)?;

        let aspect = self.aspect;
        let bounds = self.bounds;
        let (cx, cy) = self.smoothed_center();
        let size = self.smoothed_size() * zoom_factor;

        let mut height = (size / aspect).sqrt();
        let mut width = aspect * height;
        let mut x = cx - width / 2.0;
        let mut y = cy - height * vertical_bias;

        if x < bounds.x {
            let delta = bounds.x - x;
            width -= 2.0 * delta;
            height -= 2.0 * delta / aspect;
            x = bounds.x;
            y += delta / aspect;
        }
        if y < bounds.y {
            let delta = bounds.y - y;
            height -= 2.0 * delta;
            width -= 2.0 * delta * aspect;
            y = bounds.y;
            x += delta * aspect;
        }
        let right = x + width;
        if right > bounds.right() {
            let delta = right - bounds.right();
            width -= 2.0 * delta;
            height -= 2.0 * delta / aspect;
            x += delta;
            y += delta / aspect;
        }
        let bottom = y + height;
        if bottom > bounds.bottom() {
            let delta = bottom - bounds.bottom();
            height -= 2.0 * delta;
            width -= 2.0 * delta * aspect;
            y += delta;
            x += delta * aspect;
        }

        if !(width > 0.0 && height > 0.0) {
            return Err(CamtrackError::DegenerateCrop { width, height });
        }
        Ok(Rect::new(x, y, width, height))
    }

    /// Crop window using the configured zoom factor and vertical bias.
    pub fn crop(&self) -> CamtrackResult<Rect> {
        self.current_crop(self.params.zoom_factor, self.params.vertical_bias)
    }

    /// The smoothed region of interest: unzoomed and vertically centered.
    pub fn roi(&self) -> CamtrackResult<Rect> {
        self.current_crop(1.0, 0.5)
    }

    /// Replace the tuning. Smoothed values are kept; the scene bounds and
    /// aspect ratio cannot change.
    pub fn reconfigure(&mut self, params: FramingParams) -> CamtrackResult<()> {
        params.validate()?;
        self.center_x.retune(&params.center_stages())?;
        self.center_y.retune(&params.center_stages())?;
        self.size.retune(&params.size_stages())?;
        self.params = params;
        tracing::debug!(?params, "framing controller reconfigured");
        Ok(())
    }

    pub fn params(&self) -> &FramingParams {
        &self.params
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn smoothed_center(&self) -> (f64, f64) {
        (self.center_x.value(), self.center_y.value())
    }

    /// Smoothed subject area in square pixels.
    ///
    /// A bounded-acceleration size stage can carry momentum below zero when
    /// the target reverses; the area reads as zero until it recovers.
    pub fn smoothed_size(&self) -> f64 {
        self.size.value().max(0.0)
    }

    /// Velocity of the first stage of each center pipeline.
    pub fn center_velocity(&self) -> (f64, f64) {
        let first = |p: &Pipeline| p.stages().next().map_or(0.0, |s| s.velocity());
        (first(&self.center_x), first(&self.center_y))
    }

    /// The most recent valid observation, if any.
    pub fn last_target(&self) -> Option<Rect> {
        self.last_target
    }
}
