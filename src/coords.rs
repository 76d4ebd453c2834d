//! Coordinate spaces.
//!
//! Layer geometry, hit-testing and dragging all live in keyboard units
//! (one unit per key on the device grid). Other spaces convert at the edges:
//!
//! - editor preview pixels ↔ units: per-axis [`UnitScale`] of
//!   `preview size / grid size`
//! - device-native LED rectangles → units: per-axis scale of
//!   `grid size / rendered rectangle`, truncated like the vendor SDK
//! - units → raster pixels: the integer render scale of a [`Canvas`]
//!
//! [`Canvas`]: crate::raster::Canvas

use keyglow_device::{KeyboardProvider, PreviewSettings};

/// Axis-aligned rectangle in keyboard units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Point containment, inclusive of the edges
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn intersects(&self, other: &RectF) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrink by `dx`/`dy` on every side
    pub fn deflate(&self, dx: f32, dy: f32) -> RectF {
        RectF::new(
            self.x + dx,
            self.y + dy,
            (self.width - 2.0 * dx).max(0.0),
            (self.height - 2.0 * dy).max(0.0),
        )
    }

    /// Scale width/height by `factor` around the center
    pub fn scale_centered(&self, factor: f32) -> RectF {
        let w = self.width * factor;
        let h = self.height * factor;
        RectF::new(
            self.x + (self.width - w) / 2.0,
            self.y + (self.height - h) / 2.0,
            w,
            h,
        )
    }
}

/// Pixels per keyboard unit, per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub x: f64,
    pub y: f64,
}

impl UnitScale {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn uniform(scale: f64) -> Self {
        Self::new(scale, scale)
    }

    /// Scale of the editor preview picture for a `grid_w × grid_h` board
    pub fn for_preview(preview: PreviewSettings, grid_w: u32, grid_h: u32) -> Self {
        Self::new(
            f64::from(preview.width) / f64::from(grid_w.max(1)),
            f64::from(preview.height) / f64::from(grid_h.max(1)),
        )
    }

    /// Preview scale of a device
    pub fn for_device(device: &dyn KeyboardProvider) -> Self {
        Self::for_preview(device.preview_settings(), device.width(), device.height())
    }

    /// Native-units-per-grid-unit scale of a board whose SDK reports a
    /// rendered rectangle
    pub fn for_rendered(rendered: (f32, f32), grid_w: u32, grid_h: u32) -> Self {
        Self::new(
            f64::from(rendered.0) / f64::from(grid_w.max(1)),
            f64::from(rendered.1) / f64::from(grid_h.max(1)),
        )
    }

    pub fn to_units(&self, px: f64, py: f64) -> (f64, f64) {
        (px / self.x, py / self.y)
    }

    pub fn to_pixels(&self, ux: f64, uy: f64) -> (f64, f64) {
        (ux * self.x, uy * self.y)
    }

    /// Pixel → whole grid cell, truncating toward zero
    pub fn to_grid(&self, px: f64, py: f64) -> (i32, i32) {
        let (ux, uy) = self.to_units(px, py);
        (ux as i32, uy as i32)
    }
}
