//! Generic layer: a brush-filled rectangle with fully editable properties.

use tracing::trace;

use super::{LayerError, LayerModel, UpdateContext};
use crate::brush::BrushSpec;
use crate::coords::RectF;
use crate::raster::Canvas;

pub(crate) fn update(layer: &mut LayerModel, ctx: &UpdateContext) -> Result<(), LayerError> {
    let props = &layer.properties;
    if props.width <= 0 || props.height <= 0 {
        return Err(LayerError::InvalidGeometry(
            layer.id,
            format!("size {}x{}", props.width, props.height),
        ));
    }
    if !props.opacity.is_finite() {
        return Err(LayerError::InvalidOpacity(layer.id, props.opacity));
    }

    layer.resolve_base(ctx);
    let animation = layer.animation;
    animation.apply(layer, ctx.elapsed);
    trace!(
        "layer {} rect {:?} opacity {:.2}",
        layer.id,
        layer.runtime.rect,
        layer.runtime.opacity
    );
    Ok(())
}

pub(crate) fn draw(layer: &LayerModel, canvas: &mut Canvas, opacity: f32) -> Result<(), LayerError> {
    let brush = &layer.properties.brush;
    brush
        .validate()
        .map_err(|e| LayerError::InvalidBrush(layer.id, e))?;

    let rt = &layer.runtime;
    let frame = if layer.properties.contain {
        rt.rect
    } else {
        canvas.bounds()
    };
    paint(canvas, &rt.rect, &frame, brush, rt.brush_offset, rt.opacity * opacity);
    Ok(())
}

pub(crate) fn thumbnail(layer: &LayerModel, canvas: &mut Canvas) {
    let bounds = canvas.bounds();
    paint(canvas, &bounds, &bounds, &layer.properties.brush, (0.0, 0.0), 1.0);
}

/// Fill `rect` with `brush` sampled across `frame`. A nonzero offset
/// scrolls the brush and wraps it around the frame.
fn paint(
    canvas: &mut Canvas,
    rect: &RectF,
    frame: &RectF,
    brush: &BrushSpec,
    offset: (f32, f32),
    opacity: f32,
) {
    let fw = frame.width.max(f32::EPSILON);
    let fh = frame.height.max(f32::EPSILON);
    let wraps = offset != (0.0, 0.0);
    canvas.fill_with(rect, opacity, |ux, uy| {
        let mut u = (ux - frame.x) / fw + offset.0;
        let mut v = (uy - frame.y) / fh + offset.1;
        if wraps {
            u = u.rem_euclid(1.0);
            v = v.rem_euclid(1.0);
        }
        brush.sample(u, v)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{Color, GradientStop};
    use crate::data_model::DataModel;
    use crate::layer::{DynamicProperty, DynamicTarget, LayerCondition, LayerId, LayerType, Operator};
    use keyglow_device::{GridKeyboard, KeyboardLayout};

    fn ctx<'a>(kb: &'a GridKeyboard, data: &'a DataModel, is_preview: bool) -> UpdateContext<'a> {
        UpdateContext {
            device: kb,
            data,
            key_presses: &[],
            elapsed: 0.04,
            is_preview,
        }
    }

    fn layer() -> LayerModel {
        let mut layer = LayerModel::new(LayerId(1), "bar", LayerType::Generic);
        layer.properties.width = 10;
        layer.properties.height = 1;
        layer.properties.brush = BrushSpec::solid(Color::rgb(255, 0, 0));
        layer
    }

    #[test]
    fn test_zero_width_is_error() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let data = DataModel::new();
        let mut l = layer();
        l.properties.width = 0;
        assert!(matches!(
            l.update(&ctx(&kb, &data, false)),
            Err(LayerError::InvalidGeometry(..))
        ));
        assert!(l.runtime.faulted);
    }

    #[test]
    fn test_conditions_gate_drawing() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let mut data = DataModel::new();
        data.set("health", 0.0);
        let mut l = layer();
        l.properties
            .conditions
            .push(LayerCondition::new("health", Operator::Greater, 0.0));
        let canvas = RectF::new(0.0, 0.0, 21.0, 6.0);

        l.update(&ctx(&kb, &data, false)).unwrap();
        assert!(!l.must_draw(&canvas));

        // Preview ignores conditions
        l.update(&ctx(&kb, &data, true)).unwrap();
        assert!(l.must_draw(&canvas));

        data.set("health", 10.0);
        l.update(&ctx(&kb, &data, false)).unwrap();
        assert!(l.must_draw(&canvas));
    }

    #[test]
    fn test_dynamic_width_and_opacity() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let mut data = DataModel::new();
        data.set("health", 50.0);
        let mut l = layer();
        l.properties
            .dynamic
            .push(DynamicProperty::new(DynamicTarget::Width, "health", 100.0));
        l.properties
            .dynamic
            .push(DynamicProperty::new(DynamicTarget::Opacity, "health", 100.0));

        l.update(&ctx(&kb, &data, false)).unwrap();
        assert_eq!(l.runtime.rect.width, 5.0);
        assert_eq!(l.runtime.opacity, 0.5);

        l.update(&ctx(&kb, &data, true)).unwrap();
        assert_eq!(l.runtime.rect.width, 10.0);
        assert_eq!(l.runtime.opacity, 1.0);
    }

    #[test]
    fn test_draw_fills_rect_only() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let data = DataModel::new();
        let mut l = layer();
        l.update(&ctx(&kb, &data, false)).unwrap();
        let mut canvas = Canvas::new(21, 6, 4);
        l.draw(&mut canvas, 1.0).unwrap();
        assert_eq!(canvas.cell_color(9, 0), Some(Color::rgb(255, 0, 0)));
        assert_eq!(canvas.cell_color(10, 0), Some(Color::BLACK));
        assert_eq!(canvas.cell_color(0, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_uncontained_gradient_spans_canvas() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let data = DataModel::new();
        let mut l = layer();
        l.properties.x = 10;
        l.properties.width = 1;
        l.properties.contain = false;
        l.properties.brush = BrushSpec::horizontal(vec![
            GradientStop::new(0.0, Color::BLACK),
            GradientStop::new(1.0, Color::WHITE),
        ]);
        l.update(&ctx(&kb, &data, false)).unwrap();
        let mut canvas = Canvas::new(21, 6, 1);
        l.draw(&mut canvas, 1.0).unwrap();
        // Cell 10 sits at the middle of the keyboard-wide gradient
        let c = canvas.cell_color(10, 0).unwrap();
        assert!((c.r as i32 - 128).abs() <= 2, "{c}");
    }

    #[test]
    fn test_invalid_brush_is_draw_error() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let data = DataModel::new();
        let mut l = layer();
        l.properties.brush = BrushSpec::RadialGradient { stops: vec![] };
        l.update(&ctx(&kb, &data, false)).unwrap();
        let mut canvas = Canvas::new(21, 6, 1);
        assert!(matches!(
            l.draw(&mut canvas, 1.0),
            Err(LayerError::InvalidBrush(..))
        ));
    }
}
