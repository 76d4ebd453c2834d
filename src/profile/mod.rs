//! Profiles: an ordered tree of layers for one (game, keyboard) pair.
//!
//! Layers live in an arena keyed by [`LayerId`]. Each sibling group (the
//! root list, or a layer's `children`) is kept sorted by `order`, and
//! [`ProfileModel::fix_order`] renumbers every group to a dense `0..n-1`.
//! Smaller order means closer to the viewer: composite paints each group
//! from the highest order down.

pub mod demo;
pub mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layer::{LayerId, LayerModel, LayerType};

pub use store::{JsonProfileStore, LoadError, ProfileStore};

/// A profile shared between the tick and the editor; one lock covers both
pub type SharedProfile = Arc<Mutex<ProfileModel>>;

/// Structural problems found by [`ProfileModel::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("layer {0} is referenced but missing")]
    MissingLayer(LayerId),

    #[error("layer {id} is stored under key {key}")]
    IdMismatch { key: LayerId, id: LayerId },

    #[error("root layer {0} has a parent")]
    RootHasParent(LayerId),

    #[error("layer {child} is listed under {listed:?} but points to {parent:?}")]
    ParentMismatch {
        child: LayerId,
        listed: Option<LayerId>,
        parent: Option<LayerId>,
    },

    #[error("layer {0} is reachable more than once")]
    DuplicateReference(LayerId),

    #[error("layer {0} is not reachable from any root")]
    Unreachable(LayerId),

    #[error("sibling orders under {parent:?} are not 0..n-1: {orders:?}")]
    BadOrder {
        parent: Option<LayerId>,
        orders: Vec<i32>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileModel {
    pub name: String,
    pub keyboard_slug: String,
    pub game_name: String,
    #[serde(with = "arena")]
    layers: BTreeMap<LayerId, LayerModel>,
    #[serde(default)]
    roots: Vec<LayerId>,
    #[serde(default)]
    next_id: u64,
}

impl ProfileModel {
    pub fn new(
        name: impl Into<String>,
        keyboard_slug: impl Into<String>,
        game_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            keyboard_slug: keyboard_slug.into(),
            game_name: game_name.into(),
            layers: BTreeMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerModel> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut LayerModel> {
        self.layers.get_mut(&id)
    }

    /// Root group, sorted by order
    pub fn roots(&self) -> &[LayerId] {
        &self.roots
    }

    /// Children of `parent`, or the roots for `None`
    pub fn group(&self, parent: Option<LayerId>) -> &[LayerId] {
        match parent.and_then(|p| self.layers.get(&p)) {
            Some(layer) => &layer.children,
            None => &self.roots,
        }
    }

    /// The sibling group containing `id` (including `id` itself)
    pub fn siblings_of(&self, id: LayerId) -> Option<&[LayerId]> {
        let layer = self.layers.get(&id)?;
        Some(self.group(layer.parent))
    }

    /// Every layer, parents before children, each group in ascending order
    pub fn walk_pre_order(&self) -> Vec<LayerId> {
        let mut out = Vec::with_capacity(self.layers.len());
        let mut stack: Vec<LayerId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(layer) = self.layers.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(layer.children.iter().rev());
        }
        out
    }

    /// Back-to-front paint sequence: each group from highest order to
    /// lowest, a layer's children painted right after the layer itself.
    /// The last entry is the topmost layer.
    pub fn paint_order(&self) -> Vec<LayerId> {
        let mut out = Vec::with_capacity(self.layers.len());
        let mut stack: Vec<LayerId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            let Some(layer) = self.layers.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(layer.children.iter());
        }
        out
    }

    /// Whether a layer and all of its ancestors are drawable at design time
    pub fn is_visible(&self, id: LayerId) -> bool {
        let mut cur = Some(id);
        while let Some(layer_id) = cur {
            match self.layers.get(&layer_id) {
                Some(layer) if layer.is_drawable() => cur = layer.parent,
                _ => return false,
            }
        }
        true
    }

    /// Wrap for sharing with the engine
    pub fn into_shared(self) -> SharedProfile {
        Arc::new(Mutex::new(self))
    }

    /// Nesting depth of a layer (roots are 0)
    pub fn depth(&self, id: LayerId) -> usize {
        let mut depth = 0;
        let mut cur = self.layers.get(&id).and_then(|l| l.parent);
        while let Some(p) = cur {
            depth += 1;
            cur = self.layers.get(&p).and_then(|l| l.parent);
        }
        depth
    }

    // ── Structural edits ─────────────────────────────────────────────

    fn alloc_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn group_mut(&mut self, parent: Option<LayerId>) -> &mut Vec<LayerId> {
        if let Some(p) = parent {
            if let Some(layer) = self.layers.get_mut(&p) {
                return &mut layer.children;
            }
        }
        &mut self.roots
    }

    /// Add a new generic layer as the last sibling under `parent` (or at
    /// the root; an unknown parent also means the root)
    pub fn add_layer(&mut self, parent: Option<LayerId>) -> LayerId {
        self.add_layer_of(parent, LayerType::Generic, "New layer")
    }

    /// Add a new layer of a given type as the last sibling under `parent`
    pub fn add_layer_of(
        &mut self,
        parent: Option<LayerId>,
        kind: LayerType,
        name: impl Into<String>,
    ) -> LayerId {
        let parent = parent.filter(|p| self.layers.contains_key(p));
        let id = self.alloc_id();
        let mut layer = LayerModel::new(id, name, kind);
        layer.parent = parent;
        layer.order = self.group(parent).len() as i32;
        self.layers.insert(id, layer);
        self.group_mut(parent).push(id);
        self.fix_order();
        debug!("added layer {id} under {parent:?}");
        id
    }

    /// Swap a layer with its neighbour. `up` moves it towards order 0,
    /// i.e. visually on top. No-op at either end of the group.
    pub fn reorder(&mut self, id: LayerId, up: bool) {
        let Some(siblings) = self.siblings_of(id) else {
            return;
        };
        let Some(pos) = siblings.iter().position(|s| *s == id) else {
            return;
        };
        let neighbour = if up {
            pos.checked_sub(1).map(|p| siblings[p])
        } else {
            siblings.get(pos + 1).copied()
        };
        let Some(neighbour) = neighbour else {
            return;
        };

        let (Some(a), Some(b)) = (self.layers.get(&id), self.layers.get(&neighbour)) else {
            return;
        };
        let (order_a, order_b) = (a.order, b.order);
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.order = order_b;
        }
        if let Some(layer) = self.layers.get_mut(&neighbour) {
            layer.order = order_a;
        }
        self.fix_order();
    }

    /// Renumber every sibling group to `0..n-1`, keeping relative order.
    /// Ties keep their current list position. Idempotent.
    pub fn fix_order(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        self.normalize_group(&mut roots);
        self.roots = roots;

        let ids: Vec<LayerId> = self.layers.keys().copied().collect();
        for id in ids {
            let Some(mut children) = self.layers.get_mut(&id).map(|l| std::mem::take(&mut l.children))
            else {
                continue;
            };
            self.normalize_group(&mut children);
            if let Some(layer) = self.layers.get_mut(&id) {
                layer.children = children;
            }
        }
    }

    fn normalize_group(&mut self, group: &mut [LayerId]) {
        group.sort_by_key(|id| self.layers.get(id).map(|l| l.order).unwrap_or(i32::MAX));
        for (i, id) in group.iter().enumerate() {
            if let Some(layer) = self.layers.get_mut(id) {
                layer.order = i as i32;
            }
        }
    }

    /// Detached copy of a layer with a fresh id and `order - 1`, so that
    /// once inserted it sorts directly above the original. Children are not
    /// copied; see [`clone_layer`](Self::clone_layer).
    pub fn duplicate(&mut self, id: LayerId) -> Option<LayerModel> {
        let mut copy = self.layers.get(&id)?.clone();
        copy.id = self.alloc_id();
        copy.order -= 1;
        copy.children.clear();
        Some(copy)
    }

    /// Deep-copy a layer and its subtree into the same sibling group,
    /// directly above the original
    pub fn clone_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let copy = self.duplicate(id)?;
        let new_id = copy.id;
        let parent = copy.parent;
        self.layers.insert(new_id, copy);
        self.group_mut(parent).push(new_id);
        self.copy_children(id, new_id);
        self.fix_order();
        debug!("cloned layer {id} as {new_id}");
        Some(new_id)
    }

    fn copy_children(&mut self, from: LayerId, to: LayerId) {
        let children = self
            .layers
            .get(&from)
            .map(|l| l.children.clone())
            .unwrap_or_default();
        for child in children {
            let Some(mut copy) = self.layers.get(&child).cloned() else {
                continue;
            };
            let child_id = self.alloc_id();
            copy.id = child_id;
            copy.parent = Some(to);
            copy.children.clear();
            self.layers.insert(child_id, copy);
            if let Some(parent) = self.layers.get_mut(&to) {
                parent.children.push(child_id);
            }
            self.copy_children(child, child_id);
        }
    }

    /// Remove a layer and its subtree. Unknown ids are a no-op.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let Some(layer) = self.layers.get(&id) else {
            return false;
        };
        let parent = layer.parent;
        self.group_mut(parent).retain(|c| *c != id);

        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(removed) = self.layers.remove(&cur) {
                stack.extend(removed.children);
            }
        }
        self.fix_order();
        debug!("removed layer {id}");
        true
    }

    /// Re-run every layer's property coercion (after loading)
    pub fn setup_layers(&mut self) {
        for layer in self.layers.values_mut() {
            layer.setup_properties();
        }
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Check parent/child links and sibling orders
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (key, layer) in &self.layers {
            if *key != layer.id {
                return Err(ProfileError::IdMismatch {
                    key: *key,
                    id: layer.id,
                });
            }
        }

        let mut seen = BTreeSet::new();
        let mut stack: Vec<(Option<LayerId>, LayerId)> =
            self.roots.iter().map(|r| (None, *r)).collect();
        while let Some((listed, id)) = stack.pop() {
            let layer = self
                .layers
                .get(&id)
                .ok_or(ProfileError::MissingLayer(id))?;
            if listed.is_none() && layer.parent.is_some() {
                return Err(ProfileError::RootHasParent(id));
            }
            if layer.parent != listed {
                return Err(ProfileError::ParentMismatch {
                    child: id,
                    listed,
                    parent: layer.parent,
                });
            }
            if !seen.insert(id) {
                return Err(ProfileError::DuplicateReference(id));
            }
            stack.extend(layer.children.iter().map(|c| (Some(id), *c)));
        }

        if let Some(orphan) = self.layers.keys().find(|id| !seen.contains(id)) {
            return Err(ProfileError::Unreachable(*orphan));
        }

        self.check_orders(None, &self.roots)?;
        for layer in self.layers.values() {
            self.check_orders(Some(layer.id), &layer.children)?;
        }
        Ok(())
    }

    fn check_orders(&self, parent: Option<LayerId>, group: &[LayerId]) -> Result<(), ProfileError> {
        let orders: Vec<i32> = group
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.order))
            .collect();
        let dense = orders.iter().enumerate().all(|(i, o)| *o == i as i32);
        if !dense {
            return Err(ProfileError::BadOrder { parent, orders });
        }
        Ok(())
    }

    /// Make `next_id` larger than every id in use (files edited by hand)
    pub(crate) fn reserve_ids(&mut self) {
        let max = self.layers.keys().map(|id| id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max + 1);
    }
}

/// Serialize the arena as a flat list of layers
mod arena {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::layer::{LayerId, LayerModel};

    pub fn serialize<S: Serializer>(
        layers: &BTreeMap<LayerId, LayerModel>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&LayerModel> = layers.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<LayerId, LayerModel>, D::Error> {
        let list = Vec::<LayerModel>::deserialize(deserializer)?;
        let mut layers = BTreeMap::new();
        for layer in list {
            let id = layer.id;
            if layers.insert(id, layer).is_some() {
                return Err(D::Error::custom(format!("duplicate layer id {id}")));
            }
        }
        Ok(layers)
    }
}
