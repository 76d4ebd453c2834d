//! Backend for boards that address LEDs by grid position.
//!
//! Key positions come straight from a [`KeyboardLayout`]; the layout choice
//! (QWERTY/AZERTY) is fixed when the backend is built.

use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::DeviceError;
use crate::keycode::KeyCode;
use crate::layout::KeyboardLayout;
use crate::output::{resize_to_grid, LedOutput};
use crate::{KeyMatch, KeyboardProvider, PreviewSettings};

/// Grid-addressed keyboard
pub struct GridKeyboard {
    name: String,
    slug: String,
    cant_enable_text: String,
    preview: PreviewSettings,
    layout: KeyboardLayout,
    available: AtomicBool,
    enabled: AtomicBool,
    output: LedOutput,
}

impl GridKeyboard {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        layout: KeyboardLayout,
        preview: PreviewSettings,
    ) -> Self {
        let name = name.into();
        let cant_enable_text = format!(
            "Couldn't connect to your {name}.\n\
             Please check your cables and that the vendor lighting service is running.\n\n\
             If needed, you can select a different keyboard in the settings."
        );
        Self {
            name,
            slug: slug.into(),
            cant_enable_text,
            preview,
            layout,
            available: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            output: LedOutput::new(),
        }
    }

    /// Logitech G810: 21×6 full-size board
    pub fn g810(layout: KeyboardLayout) -> Self {
        Self::new(
            "Logitech G810 RGB",
            "logitech-g810",
            layout,
            PreviewSettings::new(675, 185),
        )
    }

    /// Logitech G910: the G810 grid plus a macro column on the left
    pub fn g910(layout: KeyboardLayout) -> Self {
        Self::new(
            "Logitech G910 RGB",
            "logitech-g910",
            layout.offset(1, 0, 22, 6),
            PreviewSettings::new(570, 175),
        )
    }

    /// Simulate the vendor service appearing or disappearing
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Frames received so far
    pub fn output(&self) -> &LedOutput {
        &self.output
    }
}

impl KeyboardProvider for GridKeyboard {
    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn width(&self) -> u32 {
        self.layout.width()
    }

    fn height(&self) -> u32 {
        self.layout.height()
    }

    fn preview_settings(&self) -> PreviewSettings {
        self.preview
    }

    fn cant_enable_text(&self) -> &str {
        &self.cant_enable_text
    }

    fn can_enable(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn enable(&self) -> Result<(), DeviceError> {
        if !self.can_enable() {
            return Err(DeviceError::CannotEnable(self.cant_enable_text.clone()));
        }
        self.enabled.store(true, Ordering::SeqCst);
        info!("{} enabled ({})", self.name, self.layout.name());
        Ok(())
    }

    fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            self.output.clear();
            debug!("{} disabled", self.name);
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn get_key_position(&self, key: KeyCode) -> Option<KeyMatch> {
        self.layout
            .key_position(key)
            .map(|(x, y)| KeyMatch::new(key, x, y))
    }

    fn draw_bitmap(&self, bitmap: &RgbaImage) -> Result<(), DeviceError> {
        if !self.is_enabled() {
            return Err(DeviceError::NotEnabled(self.slug.clone()));
        }
        let frame = resize_to_grid(bitmap, self.width(), self.height())?;
        self.output.write(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_enable_disable() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        assert!(!kb.is_enabled());
        kb.enable().unwrap();
        assert!(kb.is_enabled());
        kb.disable();
        assert!(!kb.is_enabled());
        // Second disable is harmless
        kb.disable();
    }

    #[test]
    fn test_cannot_enable() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        kb.set_available(false);
        let err = kb.enable().unwrap_err();
        assert!(err.to_string().contains("Couldn't connect"));
        assert!(!kb.is_enabled());
    }

    #[test]
    fn test_key_position() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let m = kb.get_key_position(KeyCode::SEMICOLON).unwrap();
        assert_eq!((m.x, m.y), (10, 3));
        assert!(kb.get_key_position(KeyCode(0x64)).is_none());
    }

    #[test]
    fn test_g910_offset() {
        let kb = GridKeyboard::g910(KeyboardLayout::qwerty());
        assert_eq!(kb.width(), 22);
        assert_eq!(kb.get_key_position(KeyCode::ESC).map(|m| m.x), Some(1));
    }

    #[test]
    fn test_draw_requires_enable() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let img = RgbaImage::new(84, 24);
        assert!(matches!(
            kb.draw_bitmap(&img),
            Err(DeviceError::NotEnabled(_))
        ));
    }

    #[test]
    fn test_draw_scales_to_grid() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        kb.enable().unwrap();
        let img = RgbaImage::from_pixel(84, 24, Rgba([0, 255, 0, 255]));
        kb.draw_bitmap(&img).unwrap();
        let frame = kb.output().last_frame().unwrap();
        assert_eq!(frame.dimensions(), (21, 6));
        assert_eq!(kb.output().color_at(0, 0), Some(Rgba([0, 255, 0, 255])));
    }
}
