//! Backend for boards that report LEDs as physical rectangles.
//!
//! The vendor SDK describes each LED by its rectangle in device-native
//! millimetres, relative to the rendered rectangle of the whole board.
//! Key lookups normalize those rectangles to keyboard-unit grid positions
//! with a per-axis multiplier `grid / rendered`, truncating like the SDK's
//! integer cast.

use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DeviceError;
use crate::keycode::KeyCode;
use crate::layout::KeyboardLayout;
use crate::output::{resize_to_grid, stretch_row, LedOutput};
use crate::{KeyMatch, KeyboardProvider, PreviewSettings};

/// Distance between key centers on a standard board (mm)
pub const KEY_PITCH_MM: f32 = 19.05;

/// Inset of the LED window inside its keycap (mm)
const LED_INSET_MM: f32 = 1.0;

/// LED rectangle in device-native millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Board models the SDK can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedRectModel {
    K95,
    K70,
    K65,
    Strafe,
}

impl LedRectModel {
    pub const ALL: &'static [LedRectModel] = &[
        LedRectModel::K95,
        LedRectModel::K70,
        LedRectModel::K65,
        LedRectModel::Strafe,
    ];

    /// Model string as reported by the SDK
    pub fn sdk_name(&self) -> &'static str {
        match self {
            LedRectModel::K95 => "K95 RGB",
            LedRectModel::K70 => "K70 RGB",
            LedRectModel::K65 => "K65 RGB",
            LedRectModel::Strafe => "STRAFE RGB",
        }
    }

    /// Parse an SDK model string, including known aliases
    pub fn from_sdk_name(name: &str) -> Option<Self> {
        match name {
            "K95 RGB" => Some(LedRectModel::K95),
            "K70 RGB" | "K70 RGB RAPIDFIRE" | "K70 LUX RGB" => Some(LedRectModel::K70),
            "K65 RGB" | "CGK65 RGB" | "K65 LUX RGB" | "K65 RGB RAPIDFIRE" => {
                Some(LedRectModel::K65)
            }
            "STRAFE RGB" => Some(LedRectModel::Strafe),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            LedRectModel::K95 => "corsair-k95-rgb",
            LedRectModel::K70 => "corsair-k70-rgb",
            LedRectModel::K65 => "corsair-k65-rgb",
            LedRectModel::Strafe => "corsair-strafe-rgb",
        }
    }

    /// Grid (width, height) in keyboard units
    pub fn grid(&self) -> (u32, u32) {
        match self {
            LedRectModel::K95 => (25, 7),
            LedRectModel::K70 => (21, 7),
            LedRectModel::K65 => (18, 7),
            LedRectModel::Strafe => (22, 7),
        }
    }

    pub fn preview(&self) -> PreviewSettings {
        match self {
            LedRectModel::K95 => PreviewSettings::new(676, 190),
            LedRectModel::K70 => PreviewSettings::new(676, 210),
            LedRectModel::K65 => PreviewSettings::new(610, 240),
            LedRectModel::Strafe => PreviewSettings::new(665, 215),
        }
    }

    /// Place the standard block on this model's grid. Every model has a
    /// media row on top; the K95 adds macro columns on the left and the
    /// K65 has no numpad.
    fn key_layout(&self, base: KeyboardLayout) -> KeyboardLayout {
        let (w, h) = self.grid();
        match self {
            LedRectModel::K95 => base.offset(3, 1, w, h),
            LedRectModel::K70 | LedRectModel::Strafe => base.offset(0, 1, w, h),
            LedRectModel::K65 => base.truncate_columns(17).offset(0, 1, w, h),
        }
    }
}

/// Keyboard whose SDK reports LED rectangles
pub struct LedRectKeyboard {
    model: LedRectModel,
    width: u32,
    height: u32,
    leds: Vec<(KeyCode, LedRect)>,
    rendered: (f32, f32),
    cant_enable_text: String,
    available: AtomicBool,
    enabled: AtomicBool,
    output: LedOutput,
}

impl LedRectKeyboard {
    /// Build the LED table for a model from a key layout
    pub fn new(model: LedRectModel, layout: KeyboardLayout) -> Self {
        let placed = model.key_layout(layout);
        let (width, height) = model.grid();
        let leds = placed
            .keys()
            .iter()
            .map(|&(key, x, y)| {
                let rect = LedRect {
                    x: x as f32 * KEY_PITCH_MM + LED_INSET_MM,
                    y: y as f32 * KEY_PITCH_MM + LED_INSET_MM,
                    width: KEY_PITCH_MM - 2.0 * LED_INSET_MM,
                    height: KEY_PITCH_MM - 2.0 * LED_INSET_MM,
                };
                (key, rect)
            })
            .collect();
        let rendered = (
            width as f32 * KEY_PITCH_MM,
            height as f32 * KEY_PITCH_MM,
        );
        Self::with_leds(model, leds, rendered)
    }

    /// Build from an explicit LED table and rendered rectangle
    pub fn with_leds(
        model: LedRectModel,
        leds: Vec<(KeyCode, LedRect)>,
        rendered: (f32, f32),
    ) -> Self {
        let (width, height) = model.grid();
        Self {
            model,
            width,
            height,
            leds,
            rendered,
            cant_enable_text: "Couldn't connect to your Corsair keyboard.\n\
                Please check your cables and/or drivers (could be outdated) and that the \
                Corsair Utility Engine is running.\n\
                In CUE, make sure \"Enable SDK\" is checked under Settings > Program.\n\n\
                If needed, you can select a different keyboard in the settings."
                .to_string(),
            available: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            output: LedOutput::new(),
        }
    }

    pub fn model(&self) -> LedRectModel {
        self.model
    }

    /// Simulate the SDK becoming (un)available
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Native LED rectangle for a key
    pub fn led_rect(&self, key: KeyCode) -> Option<LedRect> {
        self.leds
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, rect)| rect)
    }

    /// Size of the board's rendered rectangle in native units
    pub fn rendered_rectangle(&self) -> (f32, f32) {
        self.rendered
    }

    pub fn output(&self) -> &LedOutput {
        &self.output
    }

    fn multipliers(&self) -> (f32, f32) {
        (
            self.width as f32 / self.rendered.0,
            self.height as f32 / self.rendered.1,
        )
    }
}

impl KeyboardProvider for LedRectKeyboard {
    fn name(&self) -> &str {
        "Corsair RGB Keyboards"
    }

    fn slug(&self) -> &str {
        self.model.slug()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn preview_settings(&self) -> PreviewSettings {
        self.model.preview()
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
        debug!("SDK reported device as: {}", self.model.sdk_name());
        info!("{} enabled", self.model.slug());
        Ok(())
    }

    fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            self.output.clear();
            debug!("{} disabled", self.model.slug());
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn get_key_position(&self, key: KeyCode) -> Option<KeyMatch> {
        let rect = self.led_rect(key)?;
        let (wm, hm) = self.multipliers();
        Some(KeyMatch::new(
            key,
            (rect.x * wm) as i32,
            (rect.y * hm) as i32,
        ))
    }

    fn draw_bitmap(&self, bitmap: &RgbaImage) -> Result<(), DeviceError> {
        if !self.is_enabled() {
            return Err(DeviceError::NotEnabled(self.slug().to_string()));
        }
        let mut frame = resize_to_grid(bitmap, self.width, self.height)?;
        // The STRAFE's second row is taller than one grid unit
        if self.model == LedRectModel::Strafe {
            frame = stretch_row(&frame, 2);
        }
        self.output.write(frame);
        Ok(())
    }
}
