//! Keyboard lighting backends for keyglow
//!
//! This crate provides the device side of the engine:
//!
//! - [`KeyboardProvider`]: the trait every lighting backend implements
//! - [`KeyboardLayout`]: key → grid position tables
//! - [`GridKeyboard`] / [`LedRectKeyboard`]: backends for boards that report
//!   grid positions directly and boards that report physical LED rectangles
//! - [`DeviceRegistry`]: builtin backends looked up by slug

pub mod error;
pub mod grid;
pub mod keycode;
pub mod layout;
pub mod led_rect;
pub mod output;
pub mod registry;

pub use error::DeviceError;
pub use grid::GridKeyboard;
pub use keycode::KeyCode;
pub use layout::KeyboardLayout;
pub use led_rect::{LedRect, LedRectKeyboard, LedRectModel};
pub use output::LedOutput;
pub use registry::DeviceRegistry;

pub use image::RgbaImage;

use serde::{Deserialize, Serialize};

/// Position of a physical key, normalized to keyboard-unit grid space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMatch {
    pub key: KeyCode,
    pub x: i32,
    pub y: i32,
}

impl KeyMatch {
    pub fn new(key: KeyCode, x: i32, y: i32) -> Self {
        Self { key, x, y }
    }
}

/// Size of the on-screen keyboard picture used by editors, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSettings {
    pub width: u32,
    pub height: u32,
}

impl PreviewSettings {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A keyboard that can display a bitmap on its LEDs
///
/// This trait is object-safe for dynamic dispatch (`Arc<dyn KeyboardProvider>`).
/// Width and height are fixed once the backend is constructed.
pub trait KeyboardProvider: Send + Sync {
    /// User-facing device name (e.g., "Logitech G810 RGB")
    fn name(&self) -> &str;

    /// Stable identifier used to key profiles (e.g., "logitech-g810")
    fn slug(&self) -> &str;

    /// Grid width in keyboard units
    fn width(&self) -> u32;

    /// Grid height in keyboard units
    fn height(&self) -> u32;

    /// Size of the editor preview picture
    fn preview_settings(&self) -> PreviewSettings;

    /// Message shown to the user when `enable` fails
    fn cant_enable_text(&self) -> &str;

    /// Whether the backend could be enabled right now
    fn can_enable(&self) -> bool;

    /// Start the backend session
    fn enable(&self) -> Result<(), DeviceError>;

    /// Stop the backend session. Safe to call when not enabled.
    fn disable(&self);

    fn is_enabled(&self) -> bool;

    /// Grid position of a key, or `None` when the board has no LED for it
    fn get_key_position(&self, key: KeyCode) -> Option<KeyMatch>;

    /// Push a frame to the LEDs.
    ///
    /// The bitmap may be any integer multiple of the grid size; the backend
    /// scales it down to one pixel per key.
    fn draw_bitmap(&self, bitmap: &RgbaImage) -> Result<(), DeviceError>;

    /// Raster size for a given pixels-per-unit multiplier
    fn keyboard_rectangle(&self, scale: u32) -> (u32, u32) {
        (self.width() * scale, self.height() * scale)
    }
}

/// Extension trait with formatting helpers
pub trait KeyboardProviderExt: KeyboardProvider {
    /// Short description for listings
    fn description(&self) -> String {
        format!(
            "{} [{}] {}x{}",
            self.name(),
            self.slug(),
            self.width(),
            self.height()
        )
    }
}

// Blanket implementation for all KeyboardProvider implementors
impl<T: KeyboardProvider + ?Sized> KeyboardProviderExt for T {}
