//! Time-based layer animations.
//!
//! Each policy advances the layer's clock and rewrites the runtime render
//! state that [`LayerModel::resolve_base`](super::LayerModel) produced.
//! Expiry is a pure function of the clock.

use keyframe::functions as ease;
use keyframe::EasingFunction;
use serde::{Deserialize, Serialize};

use super::LayerModel;

/// Length of one grow cycle, in animation seconds
pub const GROW_CYCLE: f32 = 1.0;
pub const PULSE_CYCLE: f32 = 2.0;
/// Time to scroll the brush by one full extent
pub const SLIDE_CYCLE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimationPolicy {
    #[default]
    None,
    /// Grow from the center while fading out; transient layers expire
    /// after one cycle
    Grow,
    /// Opacity breathes down and back up
    Pulse,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
}

impl AnimationPolicy {
    pub const ALL: &'static [AnimationPolicy] = &[
        AnimationPolicy::None,
        AnimationPolicy::Grow,
        AnimationPolicy::Pulse,
        AnimationPolicy::SlideLeft,
        AnimationPolicy::SlideRight,
        AnimationPolicy::SlideUp,
        AnimationPolicy::SlideDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnimationPolicy::None => "None",
            AnimationPolicy::Grow => "Grow",
            AnimationPolicy::Pulse => "Pulse",
            AnimationPolicy::SlideLeft => "Slide left",
            AnimationPolicy::SlideRight => "Slide right",
            AnimationPolicy::SlideUp => "Slide up",
            AnimationPolicy::SlideDown => "Slide down",
        }
    }

    /// Advance the clock by `elapsed × animation_speed` and apply the
    /// transform to the layer's runtime state
    pub fn apply(self, layer: &mut LayerModel, elapsed: f32) {
        if self == AnimationPolicy::None {
            return;
        }
        let speed = layer.properties.animation_speed.max(0.0);
        let rt = &mut layer.runtime;
        rt.clock += elapsed.max(0.0) * speed;
        let clock = rt.clock;

        match self {
            AnimationPolicy::None => {}
            AnimationPolicy::Grow => {
                let progress = cycle_progress(clock, GROW_CYCLE);
                let size = ease::EaseOut.y(f64::from(progress)) as f32;
                rt.rect = rt.rect.scale_centered(size);
                rt.opacity *= 1.0 - progress;
            }
            AnimationPolicy::Pulse => {
                let progress = cycle_progress(clock, PULSE_CYCLE);
                // 1 → 0 → 1 over the cycle
                let wave = (2.0 * progress - 1.0).abs();
                rt.opacity *= ease::EaseInOut.y(f64::from(wave)) as f32;
            }
            AnimationPolicy::SlideLeft => rt.brush_offset.0 = cycle_progress(clock, SLIDE_CYCLE),
            AnimationPolicy::SlideRight => rt.brush_offset.0 = -cycle_progress(clock, SLIDE_CYCLE),
            AnimationPolicy::SlideUp => rt.brush_offset.1 = cycle_progress(clock, SLIDE_CYCLE),
            AnimationPolicy::SlideDown => rt.brush_offset.1 = -cycle_progress(clock, SLIDE_CYCLE),
        }
    }

    /// Whether a transient layer has finished. Inclusive at the boundary.
    pub fn must_expire(self, layer: &LayerModel) -> bool {
        match self {
            AnimationPolicy::Grow => layer.runtime.clock >= GROW_CYCLE,
            _ => false,
        }
    }
}

/// Position within the current cycle, in [0, 1)
fn cycle_progress(clock: f32, cycle: f32) -> f32 {
    clock.rem_euclid(cycle) / cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::RectF;
    use crate::layer::{LayerId, LayerType};

    fn layer(animation: AnimationPolicy) -> LayerModel {
        let mut layer = LayerModel::new(LayerId(1), "anim", LayerType::Generic);
        layer.properties.width = 6;
        layer.properties.height = 6;
        layer.animation = animation;
        layer.runtime.rect = layer.properties.rect();
        layer.runtime.opacity = 1.0;
        layer
    }

    #[test]
    fn test_none_is_identity() {
        let mut l = layer(AnimationPolicy::None);
        AnimationPolicy::None.apply(&mut l, 0.5);
        assert_eq!(l.runtime.clock, 0.0);
        assert_eq!(l.runtime.rect, RectF::new(0.0, 0.0, 6.0, 6.0));
        assert!(!AnimationPolicy::None.must_expire(&l));
    }

    #[test]
    fn test_grow_midway() {
        let mut l = layer(AnimationPolicy::Grow);
        AnimationPolicy::Grow.apply(&mut l, 0.5);
        assert_eq!(l.runtime.clock, 0.5);
        assert!((l.runtime.opacity - 0.5).abs() < 1e-6);
        // Ease-out is ahead of linear at the midpoint
        assert!(l.runtime.rect.width > 3.0 && l.runtime.rect.width < 6.0);
        let center = l.runtime.rect.x + l.runtime.rect.width / 2.0;
        assert!((center - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_grow_expiry_boundary_inclusive() {
        let mut l = layer(AnimationPolicy::Grow);
        l.runtime.clock = 0.999;
        assert!(!AnimationPolicy::Grow.must_expire(&l));
        l.runtime.clock = GROW_CYCLE;
        assert!(AnimationPolicy::Grow.must_expire(&l));
    }

    #[test]
    fn test_speed_scales_clock() {
        let mut l = layer(AnimationPolicy::Grow);
        l.properties.animation_speed = 2.0;
        AnimationPolicy::Grow.apply(&mut l, 0.5);
        assert!(AnimationPolicy::Grow.must_expire(&l));
    }

    #[test]
    fn test_pulse_bottoms_out_mid_cycle() {
        let mut l = layer(AnimationPolicy::Pulse);
        AnimationPolicy::Pulse.apply(&mut l, PULSE_CYCLE / 2.0);
        assert!(l.runtime.opacity < 0.01);
        assert!(!AnimationPolicy::Pulse.must_expire(&l));
    }

    #[test]
    fn test_slide_offsets() {
        let mut l = layer(AnimationPolicy::SlideLeft);
        AnimationPolicy::SlideLeft.apply(&mut l, 0.5);
        assert!((l.runtime.brush_offset.0 - 0.25).abs() < 1e-6);

        let mut l = layer(AnimationPolicy::SlideDown);
        AnimationPolicy::SlideDown.apply(&mut l, 1.0);
        assert!((l.runtime.brush_offset.1 + 0.5).abs() < 1e-6);
        assert_eq!(l.runtime.brush_offset.0, 0.0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&AnimationPolicy::SlideUp).unwrap();
        assert_eq!(json, "\"SlideUp\"");
        assert_eq!(AnimationPolicy::default(), AnimationPolicy::None);
    }
}
