//! Layers: the nodes of a profile's layer tree.
//!
//! A [`LayerModel`] owns its persisted design (`properties`, `animation`,
//! `kind`) plus a transient [`LayerRuntime`] that each tick rewrites. The
//! tree links (`parent`, `children`) are ids into the owning
//! [`ProfileModel`](crate::profile::ProfileModel)'s arena.
//!
//! Per tick a layer is first updated (its behavior resolves conditions,
//! data bindings and animation into the runtime state) and then drawn
//! from that runtime state only.

pub mod animation;
pub mod condition;
pub mod folder;
pub mod generic;
pub mod key_press;
pub mod kind;

use std::fmt;

use keyglow_device::{KeyCode, KeyboardProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::brush::{BrushSpec, Color};
use crate::coords::RectF;
use crate::data_model::DataModel;

pub use animation::AnimationPolicy;
pub use condition::{DynamicProperty, DynamicTarget, LayerCondition, Operator};
pub use key_press::KeyPressState;
pub use kind::{LayerType, THUMBNAIL_SIZE};

/// Identity of a layer within its profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-layer failure; isolated by the engine so other layers still render
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("layer {0}: invalid geometry: {1}")]
    InvalidGeometry(LayerId, String),

    #[error("layer {0}: invalid brush: {1}")]
    InvalidBrush(LayerId, String),

    #[error("layer {0}: invalid opacity {1}")]
    InvalidOpacity(LayerId, f32),
}

/// Everything a layer may read while updating
pub struct UpdateContext<'a> {
    pub device: &'a dyn KeyboardProvider,
    pub data: &'a DataModel,
    /// Key-down events drained for this tick
    pub key_presses: &'a [KeyCode],
    /// Seconds since the previous tick
    pub elapsed: f32,
    /// Editor preview: conditions and data bindings are ignored
    pub is_preview: bool,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_speed() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Persisted, user-editable layer design. Geometry is in keyboard units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub brush: BrushSpec,
    /// Sample the brush across the layer instead of the whole keyboard
    #[serde(default)]
    pub contain: bool,
    #[serde(default = "default_speed")]
    pub animation_speed: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<LayerCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic: Vec<DynamicProperty>,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            opacity: 1.0,
            brush: BrushSpec::default(),
            contain: true,
            animation_speed: 1.0,
            conditions: Vec::new(),
            dynamic: Vec::new(),
        }
    }
}

impl LayerProperties {
    pub fn rect(&self) -> RectF {
        RectF::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// Transient per-tick state, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRuntime {
    /// Animation time in seconds, already scaled by `animation_speed`
    pub clock: f32,
    /// Resolved render rectangle in units
    pub rect: RectF,
    pub opacity: f32,
    /// Brush scroll as a fraction of the brush frame
    pub brush_offset: (f32, f32),
    pub conditions_met: bool,
    /// The last update failed; skip drawing until one succeeds
    pub faulted: bool,
    /// At least one update has run
    pub initialized: bool,
}

impl Default for LayerRuntime {
    fn default() -> Self {
        Self {
            clock: 0.0,
            rect: RectF::default(),
            opacity: 0.0,
            brush_offset: (0.0, 0.0),
            conditions_met: true,
            faulted: false,
            initialized: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerModel {
    pub id: LayerId,
    pub name: String,
    /// Position among siblings; smaller is drawn later (on top)
    pub order: i32,
    #[serde(default)]
    pub parent: Option<LayerId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerId>,
    /// Soft toggle; disabled layers and their children are not drawn
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub properties: LayerProperties,
    #[serde(default)]
    pub animation: AnimationPolicy,
    pub kind: LayerType,
    #[serde(skip)]
    pub runtime: LayerRuntime,
}

impl LayerModel {
    /// New layer with default properties coerced to the kind's shape.
    ///
    /// The default brush is a rainbow color picked from the id, so fresh
    /// layers are told apart in the editor.
    pub fn new(id: LayerId, name: impl Into<String>, kind: LayerType) -> Self {
        let hue = (id.0.wrapping_mul(47) % 360) as f32;
        let mut layer = Self {
            id,
            name: name.into(),
            order: 0,
            parent: None,
            children: Vec::new(),
            enabled: true,
            properties: LayerProperties {
                brush: BrushSpec::solid(Color::from_hsv(hue, 1.0, 1.0)),
                ..LayerProperties::default()
            },
            animation: AnimationPolicy::None,
            kind,
            runtime: LayerRuntime::default(),
        };
        layer.setup_properties();
        layer
    }

    /// Resolve geometry, opacity and conditions from the persisted
    /// properties and the data model. Animation runs afterwards.
    pub(crate) fn resolve_base(&mut self, ctx: &UpdateContext) {
        let props = &self.properties;
        let mut rect = props.rect();
        let mut opacity = props.opacity.clamp(0.0, 1.0);
        let mut conditions_met = true;

        if !ctx.is_preview {
            conditions_met = props.conditions.iter().all(|c| c.evaluate(ctx.data));
            for binding in &props.dynamic {
                let Some(factor) = binding.factor(ctx.data) else {
                    continue;
                };
                match binding.target {
                    DynamicTarget::Opacity => opacity *= factor,
                    DynamicTarget::Width => rect.width *= factor,
                    DynamicTarget::Height => rect.height *= factor,
                }
            }
        }

        let rt = &mut self.runtime;
        rt.rect = rect;
        rt.opacity = opacity;
        rt.conditions_met = conditions_met;
        rt.brush_offset = (0.0, 0.0);
        rt.faulted = false;
    }

    /// Whether the last update left anything to draw on `canvas`
    pub fn must_draw(&self, canvas: &RectF) -> bool {
        let rt = &self.runtime;
        if !self.enabled || rt.faulted || !rt.conditions_met || rt.opacity <= 0.0 {
            return false;
        }
        match self.kind {
            LayerType::Folder => true,
            _ => rt.rect.intersects(canvas),
        }
    }

    /// Design-time visibility used by the editor, independent of ticks
    pub fn is_drawable(&self) -> bool {
        self.enabled && self.properties.opacity > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_defaults() {
        let layer = LayerModel::new(LayerId(3), "Glow", LayerType::Generic);
        assert_eq!(layer.properties.rect(), RectF::new(0.0, 0.0, 1.0, 1.0));
        assert!(layer.enabled);
        assert!(layer.is_drawable());
        // Nothing drawn before the first update
        assert!(!layer.must_draw(&RectF::new(0.0, 0.0, 21.0, 6.0)));
    }

    #[test]
    fn test_runtime_not_serialized() {
        let mut layer = LayerModel::new(LayerId(1), "Glow", LayerType::Generic);
        layer.runtime.clock = 5.0;
        let json = serde_json::to_string(&layer).unwrap();
        assert!(!json.contains("runtime"));
        let back: LayerModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.runtime, LayerRuntime::default());
        assert_eq!(back.properties, layer.properties);
    }

    #[test]
    fn test_properties_defaults_when_missing() {
        let json = r#"{"x": 1, "y": 2, "width": 3, "height": 4}"#;
        let props: LayerProperties = serde_json::from_str(json).unwrap();
        assert_eq!(props.opacity, 1.0);
        assert_eq!(props.animation_speed, 1.0);
        assert!(!props.contain);
        assert!(props.conditions.is_empty());
    }
}
