//! RGBA raster target for compositing.
//!
//! A [`Canvas`] covers the whole device grid at `scale` pixels per keyboard
//! unit. It starts opaque black (unlit LEDs) and every draw is a
//! source-over blend, so the final pixels are exactly what the LEDs show.

use image::{Rgba, RgbaImage};

use crate::brush::Color;
use crate::coords::RectF;

/// Clipped pixel span `[x0, x1) × [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    scale: u32,
}

impl Canvas {
    /// Canvas for a `width × height` unit grid
    pub fn new(width: u32, height: u32, scale: u32) -> Self {
        let scale = scale.max(1);
        Self {
            image: RgbaImage::from_pixel(width * scale, height * scale, Rgba([0, 0, 0, 255])),
            scale,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Canvas extent in keyboard units
    pub fn bounds(&self) -> RectF {
        RectF::new(
            0.0,
            0.0,
            (self.image.width() / self.scale) as f32,
            (self.image.height() / self.scale) as f32,
        )
    }

    /// Pixel span covered by a unit rectangle, clipped to the canvas
    pub fn pixel_rect(&self, rect: &RectF) -> Option<PixelRect> {
        let s = self.scale as f32;
        let clip = |v: f32, max: u32| v.round().clamp(0.0, max as f32) as u32;
        let (w, h) = self.image.dimensions();
        let span = PixelRect {
            x0: clip(rect.x * s, w),
            y0: clip(rect.y * s, h),
            x1: clip(rect.right() * s, w),
            y1: clip(rect.bottom() * s, h),
        };
        (span.x1 > span.x0 && span.y1 > span.y0).then_some(span)
    }

    /// Blend one pixel; out-of-range coordinates are ignored
    pub fn blend(&mut self, x: i64, y: i64, color: Color, opacity: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.image.width()) || y >= i64::from(self.image.height())
        {
            return;
        }
        let alpha = (color.a as f32 / 255.0) * opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        *dst = Rgba([
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            255,
        ]);
    }

    /// Fill a unit rectangle, asking `shade` for the color at each pixel
    /// center (given in units)
    pub fn fill_with(&mut self, rect: &RectF, opacity: f32, mut shade: impl FnMut(f32, f32) -> Color) {
        let Some(span) = self.pixel_rect(rect) else {
            return;
        };
        let s = self.scale as f32;
        for py in span.y0..span.y1 {
            let uy = (py as f32 + 0.5) / s;
            for px in span.x0..span.x1 {
                let ux = (px as f32 + 0.5) / s;
                let color = shade(ux, uy);
                self.blend(i64::from(px), i64::from(py), color, opacity);
            }
        }
    }

    pub fn fill(&mut self, rect: &RectF, color: Color) {
        self.fill_with(rect, 1.0, |_, _| color);
    }

    /// Outline a unit rectangle with a pen `thickness` pixels wide, drawn
    /// inside the rectangle
    pub fn stroke_rect(&mut self, rect: &RectF, thickness: u32, color: Color) {
        let Some(span) = self.pixel_rect(rect) else {
            return;
        };
        let t = thickness.max(1);
        for py in span.y0..span.y1 {
            for px in span.x0..span.x1 {
                let edge = px < span.x0 + t
                    || px + t >= span.x1
                    || py < span.y0 + t
                    || py + t >= span.y1;
                if edge {
                    self.blend(i64::from(px), i64::from(py), color, 1.0);
                }
            }
        }
    }

    /// Line between two unit-space points with a square pen `thickness`
    /// pixels wide
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: u32, color: Color) {
        let s = self.scale as f32;
        let (mut x0, mut y0) = ((from.0 * s).round() as i64, (from.1 * s).round() as i64);
        let (x1, y1) = ((to.0 * s).round() as i64, (to.1 * s).round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let t = i64::from(thickness.max(1));
        let lo = -(t - 1) / 2;
        loop {
            for oy in lo..lo + t {
                for ox in lo..lo + t {
                    self.blend(x0 + ox, y0 + oy, color, 1.0);
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Color at the center of a grid cell
    pub fn cell_color(&self, x: u32, y: u32) -> Option<Color> {
        let px = x * self.scale + self.scale / 2;
        let py = y * self.scale + self.scale / 2;
        if px >= self.image.width() || py >= self.image.height() {
            return None;
        }
        Some((*self.image.get_pixel(px, py)).into())
    }
}
