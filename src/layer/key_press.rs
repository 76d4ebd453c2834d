//! Key-press layer: a full-keyboard container that spawns a short-lived
//! growing glow under each pressed key.
//!
//! Key-down events reach the layer through [`UpdateContext::key_presses`],
//! drained by the engine at the start of each tick, so the transient
//! sub-layers are only touched from the tick.

use tracing::{trace, warn};

use super::{
    AnimationPolicy, LayerError, LayerId, LayerModel, LayerType, UpdateContext,
};
use crate::brush::Color;
use crate::coords::RectF;
use crate::layer::LayerProperties;
use crate::raster::Canvas;
use keyglow_device::KeyMatch;

/// Edge length of a press glow, in keyboard units
pub const PRESS_SIZE: i32 = 6;

/// Runtime state of a key-press container; never persisted
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct KeyPressState {
    #[serde(skip)]
    presses: Vec<LayerModel>,
    #[serde(skip)]
    next_press: u64,
}

impl KeyPressState {
    /// Live press glows, oldest first
    pub fn presses(&self) -> &[LayerModel] {
        &self.presses
    }

    pub fn presses_mut(&mut self) -> &mut [LayerModel] {
        &mut self.presses
    }

    fn spawn(&mut self, container: &LayerProperties, key: KeyMatch) {
        self.next_press += 1;
        let id = LayerId(self.next_press);
        let mut press = LayerModel::new(id, format!("Press {}", key.key), LayerType::Generic);
        press.properties = LayerProperties {
            x: key.x - PRESS_SIZE / 2,
            y: key.y - PRESS_SIZE / 2,
            width: PRESS_SIZE,
            height: PRESS_SIZE,
            brush: container.brush.clone(),
            contain: true,
            animation_speed: 1.0,
            ..LayerProperties::default()
        };
        press.animation = AnimationPolicy::Grow;
        self.presses.push(press);
    }
}

pub(crate) fn setup_properties(layer: &mut LayerModel) {
    layer.properties.contain = true;
}

pub(crate) fn update(layer: &mut LayerModel, ctx: &UpdateContext) -> Result<(), LayerError> {
    // The container always spans the whole device
    let props = &mut layer.properties;
    props.x = 0;
    props.y = 0;
    props.width = ctx.device.width() as i32;
    props.height = ctx.device.height() as i32;
    props.contain = true;
    layer.resolve_base(ctx);

    let initialized = layer.runtime.initialized;
    let LayerType::KeyPress(state) = &mut layer.kind else {
        return Ok(());
    };

    state.presses.retain(|press| !press.animation.must_expire(press));

    if initialized {
        for &key in ctx.key_presses {
            match ctx.device.get_key_position(key) {
                Some(pos) => state.spawn(&layer.properties, pos),
                None => trace!("no LED for key {key}"),
            }
        }
    } else if !ctx.key_presses.is_empty() {
        trace!(
            "layer {}: dropping {} key presses before first update",
            layer.id,
            ctx.key_presses.len()
        );
    }

    for press in &mut state.presses {
        if let Err(e) = press.update(ctx) {
            warn!("key press glow failed: {e}");
        }
    }
    Ok(())
}

pub(crate) fn draw(state: &KeyPressState, canvas: &mut Canvas, opacity: f32) -> Result<(), LayerError> {
    let bounds = canvas.bounds();
    for press in state.presses.iter().filter(|p| p.must_draw(&bounds)) {
        if let Err(e) = press.draw(canvas, opacity) {
            warn!("key press glow failed: {e}");
        }
    }
    Ok(())
}

/// A keycap with a glow in the brush color
pub(crate) fn thumbnail(layer: &LayerModel, canvas: &mut Canvas) {
    canvas.fill(&RectF::new(2.0, 2.0, 14.0, 14.0), Color::rgb(70, 70, 70));
    canvas.fill(&RectF::new(4.0, 3.0, 10.0, 10.0), Color::rgb(120, 120, 120));
    canvas.fill(
        &RectF::new(7.0, 6.0, 4.0, 4.0),
        layer.properties.brush.primary_color(),
    );
}
