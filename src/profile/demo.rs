//! Builtin demo profile: a scrolling gradient background, a folder of
//! data-driven indicators and a key-press glow layer on top.

use keyglow_device::KeyboardProvider;

use super::ProfileModel;
use crate::brush::{BrushSpec, Color, GradientStop};
use crate::layer::{
    AnimationPolicy, DynamicProperty, DynamicTarget, LayerCondition, LayerType, Operator,
};

/// Build the demo profile for a device. Indicators read `health` (0-100)
/// and `ammo` from the data model.
pub fn demo_profile(name: &str, game: &str, device: &dyn KeyboardProvider) -> ProfileModel {
    let (w, h) = (device.width() as i32, device.height() as i32);
    let mut profile = ProfileModel::new(name, device.slug(), game);

    let keys = profile.add_layer_of(None, LayerType::key_press(), "Key presses");
    if let Some(layer) = profile.layer_mut(keys) {
        layer.properties.brush = BrushSpec::RadialGradient {
            stops: vec![
                GradientStop::new(0.0, Color::WHITE),
                GradientStop::new(0.6, Color::rgb(0, 200, 255)),
                GradientStop::new(1.0, Color::rgba(0, 200, 255, 0)),
            ],
        };
    }

    let indicators = profile.add_layer_of(None, LayerType::Folder, "Indicators");

    let health = profile.add_layer_of(Some(indicators), LayerType::Generic, "Health bar");
    if let Some(layer) = profile.layer_mut(health) {
        layer.properties.x = 0;
        layer.properties.y = 0;
        layer.properties.width = w.min(12);
        layer.properties.height = 1;
        layer.properties.contain = true;
        layer.properties.brush = BrushSpec::horizontal(vec![
            GradientStop::new(0.0, Color::rgb(255, 0, 0)),
            GradientStop::new(1.0, Color::rgb(0, 255, 0)),
        ]);
        layer
            .properties
            .conditions
            .push(LayerCondition::new("health", Operator::Greater, 0.0));
        layer
            .properties
            .dynamic
            .push(DynamicProperty::new(DynamicTarget::Width, "health", 100.0));
    }

    let ammo = profile.add_layer_of(Some(indicators), LayerType::Generic, "Low ammo");
    if let Some(layer) = profile.layer_mut(ammo) {
        layer.properties.x = 1;
        layer.properties.y = 1;
        layer.properties.width = 12;
        layer.properties.height = 1;
        layer.properties.brush = BrushSpec::solid(Color::rgb(255, 140, 0));
        layer
            .properties
            .conditions
            .push(LayerCondition::new("ammo", Operator::Less, 10.0));
        layer.animation = AnimationPolicy::Pulse;
    }

    let background = profile.add_layer_of(None, LayerType::Generic, "Background");
    if let Some(layer) = profile.layer_mut(background) {
        layer.properties.width = w;
        layer.properties.height = h;
        layer.properties.contain = false;
        layer.properties.opacity = 0.6;
        layer.properties.brush = BrushSpec::horizontal(vec![
            GradientStop::new(0.0, Color::rgb(30, 144, 255)),
            GradientStop::new(0.5, Color::rgb(128, 0, 255)),
            GradientStop::new(1.0, Color::rgb(30, 144, 255)),
        ]);
        layer.animation = AnimationPolicy::SlideLeft;
        layer.properties.animation_speed = 0.5;
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyglow_device::{GridKeyboard, KeyboardLayout};

    #[test]
    fn test_demo_profile_shape() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let profile = demo_profile("Demo", "desktop", &kb);
        profile.validate().unwrap();
        assert_eq!(profile.len(), 5);
        assert_eq!(profile.roots().len(), 3);
        assert_eq!(profile.keyboard_slug, "logitech-g810");

        // Key presses on top, background at the bottom
        let top = profile.layer(profile.roots()[0]).unwrap();
        assert!(matches!(top.kind, LayerType::KeyPress(_)));
        let bottom = profile.layer(profile.roots()[2]).unwrap();
        assert_eq!(bottom.name, "Background");
    }
}
