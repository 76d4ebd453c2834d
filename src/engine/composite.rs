// Per-tick layer update and compositing

use tracing::{trace, warn};

use keyglow_device::KeyboardProvider;

use crate::coords::RectF;
use crate::layer::UpdateContext;
use crate::profile::ProfileModel;
use crate::raster::Canvas;

/// Update every layer, parents before children. A failing layer is logged
/// and skipped; it stays faulted until its next successful update.
pub fn update_profile(profile: &mut ProfileModel, ctx: &UpdateContext) {
    for id in profile.walk_pre_order() {
        let Some(layer) = profile.layer_mut(id) else {
            continue;
        };
        if let Err(e) = layer.update(ctx) {
            warn!("layer {} '{}' update failed: {e}", id, layer.name);
        }
    }
}

/// Paint the profile onto a fresh canvas for `device`, back to front.
///
/// A layer that must not draw hides its whole subtree; children draw at
/// the product of their ancestors' resolved opacities.
pub fn composite(profile: &ProfileModel, device: &dyn KeyboardProvider, scale: u32) -> Canvas {
    let mut canvas = Canvas::new(device.width(), device.height(), scale);
    let bounds = canvas.bounds();
    paint_group(profile, profile.roots(), &mut canvas, &bounds, 1.0);
    canvas
}

fn paint_group(
    profile: &ProfileModel,
    group: &[crate::layer::LayerId],
    canvas: &mut Canvas,
    bounds: &RectF,
    inherited: f32,
) {
    // Highest order first so order 0 lands on top
    for id in group.iter().rev() {
        let Some(layer) = profile.layer(*id) else {
            continue;
        };
        if !layer.must_draw(bounds) {
            trace!("layer {id} skipped");
            continue;
        }
        if let Err(e) = layer.draw(canvas, inherited) {
            warn!("layer {} '{}' draw failed: {e}", id, layer.name);
        }
        let opacity = inherited * layer.runtime.opacity;
        paint_group(profile, &layer.children, canvas, bounds, opacity);
    }
}
