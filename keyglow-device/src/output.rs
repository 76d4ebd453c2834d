//! Frame scaling and LED output shared by the backends.
//!
//! Rendered bitmaps arrive at `grid × scale` pixels; backends shrink them to
//! one pixel per key and keep the last frame so the LED colors can be read
//! back (the simulated equivalent of pushing a color buffer to hardware).

use std::sync::atomic::{AtomicU64, Ordering};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::error::DeviceError;

/// Shrink a bitmap to exactly `width × height` pixels.
pub fn resize_to_grid(
    bitmap: &RgbaImage,
    width: u32,
    height: u32,
) -> Result<RgbaImage, DeviceError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(DeviceError::InvalidBitmap("empty bitmap".into()));
    }
    if width == 0 || height == 0 {
        return Err(DeviceError::InvalidBitmap(format!(
            "target grid {width}x{height}"
        )));
    }
    if bitmap.dimensions() == (width, height) {
        return Ok(bitmap.clone());
    }
    Ok(imageops::resize(bitmap, width, height, FilterType::Triangle))
}

/// Duplicate row `row` downwards by one, growing the image by a row.
///
/// Some boards have a physically taller row than the grid suggests; the
/// extra LED row reads the same colors as the one above it.
pub fn stretch_row(image: &RgbaImage, row: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut out = RgbaImage::new(w, h + 1);
    imageops::overlay(&mut out, image, 0, 0);
    if row < h {
        let tail = imageops::crop_imm(image, 0, row, w, h - row).to_image();
        imageops::overlay(&mut out, &tail, 0, i64::from(row) + 1);
    }
    out
}

/// Last frame written to a backend
#[derive(Default)]
pub struct LedOutput {
    frame: Mutex<Option<RgbaImage>>,
    frames_written: AtomicU64,
}

impl LedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a grid-sized frame
    pub fn write(&self, frame: RgbaImage) {
        *self.frame.lock() = Some(frame);
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the stored frame (session ended)
    pub fn clear(&self) {
        *self.frame.lock() = None;
    }

    pub fn last_frame(&self) -> Option<RgbaImage> {
        self.frame.lock().clone()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Color of the LED at a grid position in the last frame
    pub fn color_at(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        let guard = self.frame.lock();
        let frame = guard.as_ref()?;
        if x < 0 || y < 0 || x as u32 >= frame.width() || y as u32 >= frame.height() {
            return None;
        }
        Some(*frame.get_pixel(x as u32, y as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_identity() {
        let img = RgbaImage::from_pixel(21, 6, Rgba([10, 20, 30, 255]));
        let out = resize_to_grid(&img, 21, 6).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_resize_uniform_color() {
        let img = RgbaImage::from_pixel(84, 24, Rgba([200, 0, 0, 255]));
        let out = resize_to_grid(&img, 21, 6).unwrap();
        assert_eq!(out.dimensions(), (21, 6));
        assert_eq!(*out.get_pixel(10, 3), Rgba([200, 0, 0, 255]));
    }

    #[test]
    fn test_resize_empty() {
        let img = RgbaImage::new(0, 0);
        assert!(resize_to_grid(&img, 21, 6).is_err());
    }

    #[test]
    fn test_stretch_row() {
        let mut img = RgbaImage::new(2, 3);
        for x in 0..2 {
            img.put_pixel(x, 0, Rgba([1, 0, 0, 255]));
            img.put_pixel(x, 1, Rgba([2, 0, 0, 255]));
            img.put_pixel(x, 2, Rgba([3, 0, 0, 255]));
        }
        let out = stretch_row(&img, 1);
        assert_eq!(out.dimensions(), (2, 4));
        assert_eq!(out.get_pixel(0, 0)[0], 1);
        assert_eq!(out.get_pixel(0, 1)[0], 2);
        assert_eq!(out.get_pixel(0, 2)[0], 2);
        assert_eq!(out.get_pixel(0, 3)[0], 3);
    }

    #[test]
    fn test_led_output_color_at() {
        let out = LedOutput::new();
        assert!(out.color_at(0, 0).is_none());
        out.write(RgbaImage::from_pixel(2, 2, Rgba([5, 6, 7, 255])));
        assert_eq!(out.color_at(1, 1), Some(Rgba([5, 6, 7, 255])));
        assert!(out.color_at(2, 0).is_none());
        assert!(out.color_at(-1, 0).is_none());
        assert_eq!(out.frames_written(), 1);
    }
}
