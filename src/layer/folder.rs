//! Folder layer: groups children so they can be toggled, conditioned and
//! faded together. Draws nothing of its own.

use super::{AnimationPolicy, LayerError, LayerModel, UpdateContext};
use crate::brush::Color;
use crate::coords::RectF;
use crate::raster::Canvas;

pub(crate) fn setup_properties(layer: &mut LayerModel) {
    layer.properties.contain = true;
    layer.animation = AnimationPolicy::None;
}

pub(crate) fn update(layer: &mut LayerModel, ctx: &UpdateContext) -> Result<(), LayerError> {
    if !layer.properties.opacity.is_finite() {
        return Err(LayerError::InvalidOpacity(layer.id, layer.properties.opacity));
    }
    layer.resolve_base(ctx);
    Ok(())
}

pub(crate) fn thumbnail(_layer: &LayerModel, canvas: &mut Canvas) {
    let amber = Color::rgb(232, 178, 60);
    canvas.fill(&RectF::new(1.0, 3.0, 7.0, 3.0), amber);
    canvas.fill(&RectF::new(1.0, 5.0, 16.0, 11.0), amber);
    canvas.fill(&RectF::new(2.0, 7.0, 14.0, 8.0), Color::rgb(250, 208, 110));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::DataModel;
    use crate::layer::{LayerId, LayerType};
    use keyglow_device::{GridKeyboard, KeyboardLayout};

    #[test]
    fn test_setup_resets_animation() {
        let mut layer = LayerModel::new(LayerId(1), "group", LayerType::Folder);
        layer.animation = AnimationPolicy::Pulse;
        layer.properties.contain = false;
        layer.setup_properties();
        assert_eq!(layer.animation, AnimationPolicy::None);
        assert!(layer.properties.contain);
    }

    #[test]
    fn test_folder_draws_regardless_of_rect() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let data = DataModel::new();
        let mut layer = LayerModel::new(LayerId(1), "group", LayerType::Folder);
        layer.properties.x = 100;
        let ctx = UpdateContext {
            device: &kb,
            data: &data,
            key_presses: &[],
            elapsed: 0.04,
            is_preview: false,
        };
        layer.update(&ctx).unwrap();
        let bounds = RectF::new(0.0, 0.0, 21.0, 6.0);
        assert!(layer.must_draw(&bounds));

        let mut canvas = Canvas::new(21, 6, 1);
        layer.draw(&mut canvas, 1.0).unwrap();
        assert_eq!(canvas.cell_color(0, 0), Some(Color::BLACK));
    }
}
