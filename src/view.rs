//! Camera that follows a world point and never shows past the map edges.

use macroquad::math::{vec2, Rect, Vec2};

use crate::config::ViewportConfig;
use crate::map::Map;

const ZOOM_EPSILON: f32 = 0.001;

/// World-space camera over a map of known pixel size.
///
/// The center is smoothed toward a target with a first-order low-pass filter
/// and then clamped so the visible rectangle stays inside the map. When the map
/// is smaller than the view on an axis, the center is pinned to the half view
/// extent on that axis.
#[derive(Debug, Clone)]
pub struct Viewport {
    center: Vec2,
    output: Vec2,
    bounds: Vec2,
    smooth_rate: f32,
    zoom: f32,
    target_zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    zoom_speed: f32,
    zoom_step: f32,
}

impl Viewport {
    /// Viewport of `output` pixels over a map of `bounds` pixels, with default tuning.
    pub fn new(output: Vec2, bounds: Vec2) -> Self {
        Self::from_parts(output, bounds, &ViewportConfig::default())
    }

    /// Viewport sized and tuned from configuration.
    pub fn from_config(cfg: &ViewportConfig, map: &Map) -> Self {
        Self::from_parts(vec2(cfg.width, cfg.height), map.pixel_size(), cfg)
    }

    fn from_parts(output: Vec2, bounds: Vec2, cfg: &ViewportConfig) -> Self {
        let mut vp = Self {
            center: Vec2::ZERO,
            output,
            bounds,
            smooth_rate: cfg.smooth_rate,
            zoom: 1.0,
            target_zoom: 1.0,
            min_zoom: cfg.min_zoom,
            max_zoom: cfg.max_zoom.max(cfg.min_zoom),
            zoom_speed: cfg.zoom_speed,
            zoom_step: cfg.zoom_step,
        };
        vp.set_center(output / 2.0);
        vp
    }

    /// Override the follow rate.
    pub fn with_smooth_rate(mut self, rate: f32) -> Self {
        self.smooth_rate = rate;
        self
    }

    /// World-space center.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Current zoom factor.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Screen size in pixels.
    pub fn output_size(&self) -> Vec2 {
        self.output
    }

    /// World-space size currently visible (output divided by zoom).
    pub fn view_size(&self) -> Vec2 {
        self.output / self.zoom
    }

    /// Map pixel size used for clamping.
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Re-target the viewport at another map, e.g. after a scene change.
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        self.clamp_to_map();
    }

    /// Resize the output, e.g. after a window resize.
    pub fn set_output_size(&mut self, output: Vec2) {
        self.output = output;
        self.clamp_to_map();
    }

    /// Advance one tick: smooth zoom, then move the center toward `target`.
    ///
    /// `smooth_rate * dt >= 1` snaps straight to the target.
    pub fn update(&mut self, dt: f32, target: Vec2) {
        self.update_zoom(dt);
        let k = (self.smooth_rate * dt).clamp(0.0, 1.0);
        let next = self.center + (target - self.center) * k;
        self.center = self.clamp(next);
    }

    /// Cut straight to `target` (clamped), used on scene transitions.
    pub fn follow(&mut self, target: Vec2) {
        self.center = self.clamp(target);
    }

    /// Move the center, clamped to the map.
    pub fn set_center(&mut self, p: Vec2) {
        self.center = self.clamp(p);
    }

    fn update_zoom(&mut self, dt: f32) {
        if (self.zoom - self.target_zoom).abs() > ZOOM_EPSILON {
            let k = (self.zoom_speed * dt).clamp(0.0, 1.0);
            self.zoom += (self.target_zoom - self.zoom) * k;
            self.clamp_to_map();
        }
    }

    /// Zoom being approached.
    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    /// Zoom to approach, clamped to the configured range.
    pub fn set_target_zoom(&mut self, zoom: f32) {
        self.target_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Raise the target zoom by one step.
    pub fn zoom_in(&mut self) {
        self.set_target_zoom(self.target_zoom + self.zoom_step);
    }

    /// Lower the target zoom by one step.
    pub fn zoom_out(&mut self) {
        self.set_target_zoom(self.target_zoom - self.zoom_step);
    }

    /// Target zoom back to 1.
    pub fn reset_zoom(&mut self) {
        self.set_target_zoom(1.0);
    }

    fn clamp_to_map(&mut self) {
        self.center = self.clamp(self.center);
    }

    fn clamp(&self, p: Vec2) -> Vec2 {
        let half = self.view_size() / 2.0;
        vec2(
            clamp_axis(p.x, half.x, self.bounds.x),
            clamp_axis(p.y, half.y, self.bounds.y),
        )
    }

    /// Visible world rectangle.
    pub fn visible_rect(&self) -> Rect {
        let size = self.view_size();
        let min = self.center - size / 2.0;
        Rect::new(min.x, min.y, size.x, size.y)
    }

    /// World point to screen pixels.
    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        let r = self.visible_rect();
        (p - vec2(r.x, r.y)) * self.zoom
    }

    /// Screen pixels to world point.
    pub fn screen_to_world(&self, p: Vec2) -> Vec2 {
        let r = self.visible_rect();
        p / self.zoom + vec2(r.x, r.y)
    }
}

#[inline]
fn clamp_axis(value: f32, half: f32, extent: f32) -> f32 {
    let max = half.max(extent - half);
    half.max(max.min(value))
}
