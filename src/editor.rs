//! Profile editing: pointer interaction on the keyboard preview plus the
//! structural edits of the layer list.
//!
//! Pointer positions arrive in preview pixels and are converted to keyboard
//! units before any hit-test or geometry change. Every edit takes the
//! profile lock, the same one the tick holds while updating and drawing,
//! so a tick never sees a half-applied drag.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use keyglow_device::KeyboardProvider;
use parking_lot::Mutex;
use tracing::debug;

use crate::brush::Color;
use crate::coords::UnitScale;
use crate::layer::{LayerId, LayerModel};
use crate::profile::{ProfileModel, SharedProfile};
use crate::raster::Canvas;

/// Press/release shorter than this counts as a click
pub const CLICK_THRESHOLD: Duration = Duration::from_millis(500);

/// Distance from a layer's bottom-right corner (units) that grabs the
/// resize handle
pub const RESIZE_HANDLE_DISTANCE: f64 = 0.6;

/// Selection highlight color
pub const ACCENT: Color = Color::rgb(0x1b, 0xa1, 0xe2);

/// Current editor selection, shared with the engine for the overlay
pub type SelectionHandle = Arc<Mutex<Option<LayerId>>>;

/// Pointer shape the preview should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Arrow,
    /// Over a layer that a click would select
    Hand,
    /// Over the selected layer
    Move,
    /// Over the selected layer's resize handle
    Resize,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    layer: LayerId,
    /// Pointer position relative to the layer origin when the drag began
    offset: (f64, f64),
    resize: bool,
}

/// Row of the layer list
#[derive(Debug, Clone)]
pub struct LayerListEntry {
    pub id: LayerId,
    pub name: String,
    pub kind: &'static str,
    pub depth: usize,
    pub enabled: bool,
    pub selected: bool,
    pub thumbnail: RgbaImage,
}

pub struct EditorSession {
    profile: SharedProfile,
    scale: UnitScale,
    selection: SelectionHandle,
    drag: Option<Drag>,
    pressed_at: Option<Instant>,
}

impl EditorSession {
    /// Edit `profile` through the preview picture of `device`
    pub fn new(profile: SharedProfile, device: &dyn KeyboardProvider) -> Self {
        Self::with_scale(profile, UnitScale::for_device(device))
    }

    pub fn with_scale(profile: SharedProfile, scale: UnitScale) -> Self {
        Self {
            profile,
            scale,
            selection: Arc::new(Mutex::new(None)),
            drag: None,
            pressed_at: None,
        }
    }

    pub fn profile(&self) -> &SharedProfile {
        &self.profile
    }

    /// Switch to another profile, dropping selection and drag state
    pub fn set_profile(&mut self, profile: SharedProfile) {
        self.profile = profile;
        self.drag = None;
        self.pressed_at = None;
        *self.selection.lock() = None;
    }

    pub fn selection_handle(&self) -> SelectionHandle {
        Arc::clone(&self.selection)
    }

    pub fn selected(&self) -> Option<LayerId> {
        *self.selection.lock()
    }

    /// Select a layer; unknown ids clear the selection
    pub fn select(&self, id: Option<LayerId>) {
        let id = id.filter(|id| self.profile.lock().contains(*id));
        *self.selection.lock() = id;
    }

    /// Topmost visible layer under a unit-space point
    pub fn hit_test(&self, ux: f64, uy: f64) -> Option<LayerId> {
        hit_test(&self.profile.lock(), ux, uy)
    }

    // ── Pointer ──────────────────────────────────────────────────────

    pub fn mouse_down(&mut self, _px: f64, _py: f64) {
        self.mouse_down_at(Instant::now());
    }

    pub fn mouse_down_at(&mut self, now: Instant) {
        self.pressed_at = Some(now);
    }

    /// Release. A short press selects the layer under the pointer (or
    /// clears the selection over empty space). Returns the selection.
    pub fn mouse_up(&mut self, px: f64, py: f64) -> Option<LayerId> {
        self.mouse_up_at(px, py, Instant::now())
    }

    pub fn mouse_up_at(&mut self, px: f64, py: f64, now: Instant) -> Option<LayerId> {
        self.drag = None;
        let Some(pressed) = self.pressed_at.take() else {
            return self.selected();
        };
        if now.saturating_duration_since(pressed) >= CLICK_THRESHOLD {
            return self.selected();
        }
        let (ux, uy) = self.scale.to_units(px, py);
        let hit = self.hit_test(ux, uy);
        *self.selection.lock() = hit;
        debug!("selected {hit:?}");
        hit
    }

    /// Pointer motion, dragging or resizing the selected layer while the
    /// button is held
    pub fn mouse_move(&mut self, px: f64, py: f64, pressed: bool) -> CursorHint {
        let (ux, uy) = self.scale.to_units(px, py);
        let profile = Arc::clone(&self.profile);
        let mut profile = profile.lock();
        let hover = hit_test(&profile, ux, uy);
        let selected = self.selected();

        self.drag_step(&mut profile, ux, uy, pressed, hover, selected);

        if self.drag.is_some_and(|d| d.resize && Some(d.layer) == selected) {
            return CursorHint::Resize;
        }
        match hover {
            None => CursorHint::Arrow,
            Some(id) if Some(id) == selected => {
                let near = profile
                    .layer(id)
                    .is_some_and(|l| near_resize_handle(l, ux, uy));
                if near {
                    CursorHint::Resize
                } else {
                    CursorHint::Move
                }
            }
            Some(_) => CursorHint::Hand,
        }
    }

    fn drag_step(
        &mut self,
        profile: &mut ProfileModel,
        ux: f64,
        uy: f64,
        pressed: bool,
        hover: Option<LayerId>,
        selected: Option<LayerId>,
    ) {
        if !pressed || self.drag.is_some_and(|d| Some(d.layer) != selected) {
            self.drag = None;
            return;
        }
        let Some(selected) = selected else {
            return;
        };

        if self.drag.is_none() {
            let Some(hover) = hover else {
                return;
            };
            let (Some(hovered), Some(target)) = (profile.layer(hover), profile.layer(selected))
            else {
                return;
            };
            self.drag = Some(Drag {
                layer: hover,
                offset: (
                    ux - f64::from(target.properties.x),
                    uy - f64::from(target.properties.y),
                ),
                resize: near_resize_handle(hovered, ux, uy),
            });
        }

        let Some(drag) = self.drag else {
            return;
        };
        if drag.layer != selected {
            return;
        }
        let Some(layer) = profile.layer_mut(selected) else {
            self.drag = None;
            return;
        };
        let props = &mut layer.properties;
        if drag.resize {
            props.width = ((ux - f64::from(props.x)).round() as i32).max(1);
            props.height = ((uy - f64::from(props.y)).round() as i32).max(1);
        } else {
            props.x = (ux - drag.offset.0).round() as i32;
            props.y = (uy - drag.offset.1).round() as i32;
        }
    }

    // ── Layer list ───────────────────────────────────────────────────

    /// Add a generic layer at the root and select it
    pub fn add_layer(&self) -> LayerId {
        let id = self.profile.lock().add_layer(None);
        *self.selection.lock() = Some(id);
        id
    }

    /// Remove the selected layer
    pub fn remove_selected(&self) -> bool {
        let Some(id) = self.selected() else {
            return false;
        };
        self.remove_layer(id)
    }

    pub fn remove_layer(&self, id: LayerId) -> bool {
        let selected = self.selected();
        let (removed, still_there) = {
            let mut profile = self.profile.lock();
            let removed = profile.remove_layer(id);
            (removed, selected.is_some_and(|sel| profile.contains(sel)))
        };
        if !still_there {
            *self.selection.lock() = None;
        }
        removed
    }

    /// Clone the selected layer and select the copy
    pub fn clone_selected(&self) -> Option<LayerId> {
        let id = self.selected()?;
        let clone = self.profile.lock().clone_layer(id)?;
        *self.selection.lock() = Some(clone);
        Some(clone)
    }

    /// Move the selected layer up (towards the top) or down
    pub fn move_selected(&self, up: bool) {
        if let Some(id) = self.selected() {
            self.profile.lock().reorder(id, up);
        }
    }

    /// Flattened layer tree for display, parents before children
    pub fn layer_list(&self) -> Vec<LayerListEntry> {
        let selected = self.selected();
        let profile = self.profile.lock();
        profile
            .walk_pre_order()
            .into_iter()
            .filter_map(|id| {
                let layer = profile.layer(id)?;
                Some(LayerListEntry {
                    id,
                    name: layer.name.clone(),
                    kind: layer.kind.name(),
                    depth: profile.depth(id),
                    enabled: layer.enabled,
                    selected: selected == Some(id),
                    thumbnail: layer.thumbnail(),
                })
            })
            .collect()
    }
}

fn hit_test(profile: &ProfileModel, ux: f64, uy: f64) -> Option<LayerId> {
    profile.paint_order().into_iter().rev().find(|id| {
        profile.layer(*id).is_some_and(|layer| {
            layer.kind.is_hit_testable()
                && profile.is_visible(*id)
                && layer.properties.rect().contains(ux as f32, uy as f32)
        })
    })
}

fn near_resize_handle(layer: &LayerModel, ux: f64, uy: f64) -> bool {
    let rect = layer.properties.rect();
    let dx = ux - f64::from(rect.right());
    let dy = uy - f64::from(rect.bottom());
    (dx * dx + dy * dy).sqrt() < RESIZE_HANDLE_DISTANCE
}

/// Outline the selected layer on a copy of the frame and draw the resize
/// grip at its bottom-right corner
pub fn draw_selection_overlay(canvas: &mut Canvas, layer: &LayerModel) {
    let rect = layer.properties.rect().deflate(0.2, 0.2);
    let pen = ((0.4 * canvas.scale() as f32).round() as u32).max(1);
    canvas.stroke_rect(&rect, pen, ACCENT);

    let (r, b) = (rect.right(), rect.bottom());
    canvas.line((r - 1.0, b - 0.5), (r - 1.2, b - 0.7), pen, ACCENT);
    canvas.line((r - 0.5, b - 1.0), (r - 0.7, b - 1.2), pen, ACCENT);
    canvas.line((r - 0.5, b - 0.5), (r - 0.7, b - 0.7), pen, ACCENT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::RectF;

    /// 10 preview pixels per unit on both axes
    fn session() -> (EditorSession, LayerId, LayerId) {
        let mut profile = ProfileModel::new("edit", "logitech-g810", "desktop");
        let top = profile.add_layer(None);
        let bottom = profile.add_layer(None);
        {
            let l = profile.layer_mut(top).unwrap();
            l.properties.x = 2;
            l.properties.y = 1;
            l.properties.width = 4;
            l.properties.height = 2;
        }
        {
            let l = profile.layer_mut(bottom).unwrap();
            l.properties.x = 0;
            l.properties.y = 0;
            l.properties.width = 21;
            l.properties.height = 6;
        }
        let editor = EditorSession::with_scale(profile.into_shared(), UnitScale::uniform(10.0));
        (editor, top, bottom)
    }

    fn click(editor: &mut EditorSession, px: f64, py: f64) -> Option<LayerId> {
        editor.mouse_down(px, py);
        editor.mouse_up(px, py)
    }

    fn rect_of(editor: &EditorSession, id: LayerId) -> RectF {
        editor.profile().lock().layer(id).unwrap().properties.rect()
    }

    #[test]
    fn test_click_selects_topmost() {
        let (mut editor, top, bottom) = session();
        assert_eq!(click(&mut editor, 30.0, 15.0), Some(top));
        assert_eq!(click(&mut editor, 150.0, 50.0), Some(bottom));
        assert_eq!(editor.selected(), Some(bottom));
        // Outside every layer clears the selection
        assert_eq!(click(&mut editor, 500.0, 500.0), None);
    }

    #[test]
    fn test_long_press_does_not_select() {
        let (mut editor, top, _) = session();
        let start = Instant::now();
        editor.mouse_down_at(start);
        let sel = editor.mouse_up_at(30.0, 15.0, start + Duration::from_millis(600));
        assert_eq!(sel, None);
        assert_ne!(editor.selected(), Some(top));
    }

    #[test]
    fn test_hidden_layers_are_not_hit() {
        let (mut editor, top, bottom) = session();
        editor.profile().lock().layer_mut(top).unwrap().enabled = false;
        assert_eq!(click(&mut editor, 30.0, 15.0), Some(bottom));
    }

    #[test]
    fn test_drag_moves_selected_layer() {
        let (mut editor, top, _) = session();
        click(&mut editor, 30.0, 15.0);
        // Grab at (3, 1.5): offset (1, 0.5) from the origin
        assert_eq!(editor.mouse_move(30.0, 15.0, true), CursorHint::Move);
        editor.mouse_move(60.0, 35.0, true);
        assert_eq!(rect_of(&editor, top), RectF::new(5.0, 3.0, 4.0, 2.0));
        // Release ends the drag
        editor.mouse_move(60.0, 35.0, false);
        editor.mouse_move(100.0, 35.0, false);
        assert_eq!(rect_of(&editor, top), RectF::new(5.0, 3.0, 4.0, 2.0));
    }

    #[test]
    fn test_drag_near_corner_resizes() {
        let (mut editor, top, _) = session();
        click(&mut editor, 30.0, 15.0);
        // Bottom-right corner of the top layer is (6, 3)
        assert_eq!(editor.mouse_move(58.0, 28.0, true), CursorHint::Resize);
        editor.mouse_move(91.0, 52.0, true);
        assert_eq!(rect_of(&editor, top), RectF::new(2.0, 1.0, 7.0, 4.0));
        // Never below one unit
        editor.mouse_move(0.0, 0.0, true);
        assert_eq!(rect_of(&editor, top), RectF::new(2.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_drag_unselected_layer_is_noop() {
        let (mut editor, top, bottom) = session();
        click(&mut editor, 30.0, 15.0);
        assert_eq!(editor.selected(), Some(top));
        // Press over the bottom layer only
        assert_eq!(editor.mouse_move(150.0, 50.0, true), CursorHint::Hand);
        editor.mouse_move(120.0, 40.0, true);
        assert_eq!(rect_of(&editor, bottom), RectF::new(0.0, 0.0, 21.0, 6.0));
        assert_eq!(rect_of(&editor, top), RectF::new(2.0, 1.0, 4.0, 2.0));
    }

    #[test]
    fn test_cursor_over_empty_space() {
        let (mut editor, ..) = session();
        assert_eq!(editor.mouse_move(500.0, 500.0, false), CursorHint::Arrow);
    }

    #[test]
    fn test_structural_edits_track_selection() {
        let (mut editor, top, _) = session();
        click(&mut editor, 30.0, 15.0);
        let clone = editor.clone_selected().unwrap();
        assert_eq!(editor.selected(), Some(clone));
        assert_eq!(editor.profile().lock().roots()[0], clone);

        editor.move_selected(false);
        assert_eq!(editor.profile().lock().roots()[1], clone);

        assert!(editor.remove_selected());
        assert_eq!(editor.selected(), None);
        assert!(editor.profile().lock().contains(top));

        let added = editor.add_layer();
        assert_eq!(editor.selected(), Some(added));
        assert_eq!(editor.layer_list().len(), 3);
    }

    #[test]
    fn test_layer_list_depth_and_thumbnails() {
        let (editor, top, _) = session();
        let child = editor.profile().lock().add_layer(Some(top));
        editor.select(Some(child));
        let list = editor.layer_list();
        let entry = list.iter().find(|e| e.id == child).unwrap();
        assert_eq!(entry.depth, 1);
        assert!(entry.selected);
        assert_eq!(entry.thumbnail.dimensions(), (18, 18));
    }

    #[test]
    fn test_overlay_outlines_inside_layer() {
        let layer = {
            let mut l = LayerModel::new(LayerId(1), "sel", crate::layer::LayerType::Generic);
            l.properties.width = 4;
            l.properties.height = 3;
            l
        };
        let mut canvas = Canvas::new(6, 4, 4);
        draw_selection_overlay(&mut canvas, &layer);
        // Outline starts 0.2 units (1 px) inside the rect
        assert_eq!(Color::from(*canvas.image().get_pixel(1, 6)), ACCENT);
        assert_eq!(Color::from(*canvas.image().get_pixel(0, 6)), Color::BLACK);
        // Nothing outside the layer
        assert_eq!(canvas.cell_color(5, 3), Some(Color::BLACK));
    }
}
