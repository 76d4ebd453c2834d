//! Layer type dispatch.
//!
//! The set of layer behaviors is closed; each variant's logic lives in its
//! own module and is reached through a `match` here.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::key_press::KeyPressState;
use super::{folder, generic, key_press, LayerError, LayerModel, UpdateContext};
use crate::raster::Canvas;

/// Edge length of layer thumbnails, in pixels
pub const THUMBNAIL_SIZE: u32 = 18;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerType {
    /// A brush-filled rectangle
    #[default]
    Generic,
    /// Spawns a short-lived glow under every pressed key
    KeyPress(KeyPressState),
    /// Groups children and fades them together
    Folder,
}

impl LayerType {
    pub fn key_press() -> Self {
        LayerType::KeyPress(KeyPressState::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerType::Generic => "Generic",
            LayerType::KeyPress(_) => "Keyboard - Key press",
            LayerType::Folder => "Folder",
        }
    }

    /// Whether the editor can pick the layer by clicking the preview
    pub fn is_hit_testable(&self) -> bool {
        matches!(self, LayerType::Generic)
    }
}

impl LayerModel {
    /// Coerce the stored properties to the shape this layer's type needs.
    /// A no-op when they already fit.
    pub fn setup_properties(&mut self) {
        match self.kind {
            LayerType::Generic => {}
            LayerType::KeyPress(_) => key_press::setup_properties(self),
            LayerType::Folder => folder::setup_properties(self),
        }
    }

    /// Advance this layer by one tick
    pub fn update(&mut self, ctx: &UpdateContext) -> Result<(), LayerError> {
        let result = match self.kind {
            LayerType::Generic => generic::update(self, ctx),
            LayerType::KeyPress(_) => key_press::update(self, ctx),
            LayerType::Folder => folder::update(self, ctx),
        };
        self.runtime.initialized = true;
        if result.is_err() {
            self.runtime.faulted = true;
        }
        result
    }

    /// Draw this layer's own content (not its children) at `opacity`
    /// inherited from its ancestors
    pub fn draw(&self, canvas: &mut Canvas, opacity: f32) -> Result<(), LayerError> {
        match &self.kind {
            LayerType::Generic => generic::draw(self, canvas, opacity),
            LayerType::KeyPress(state) => key_press::draw(state, canvas, opacity),
            LayerType::Folder => Ok(()),
        }
    }

    /// Cheap 18×18 preview for layer lists
    pub fn thumbnail(&self) -> RgbaImage {
        let mut canvas = Canvas::new(THUMBNAIL_SIZE, THUMBNAIL_SIZE, 1);
        match self.kind {
            LayerType::Generic => generic::thumbnail(self, &mut canvas),
            LayerType::KeyPress(_) => key_press::thumbnail(self, &mut canvas),
            LayerType::Folder => folder::thumbnail(self, &mut canvas),
        }
        canvas.into_image()
    }
}
