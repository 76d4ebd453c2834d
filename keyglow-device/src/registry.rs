// Device registry
// Builtin lighting backends looked up by slug

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::DeviceError;
use crate::grid::GridKeyboard;
use crate::layout::KeyboardLayout;
use crate::led_rect::{LedRectKeyboard, LedRectModel};
use crate::KeyboardProvider;

/// Registry for keyboard backends
pub struct DeviceRegistry {
    by_slug: BTreeMap<String, Arc<dyn KeyboardProvider>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_slug: BTreeMap::new(),
        }
    }

    /// Create a registry with the builtin backends, placing keys
    /// according to `layout`
    pub fn with_builtins(layout: &KeyboardLayout) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GridKeyboard::g810(layout.clone())));
        registry.register(Arc::new(GridKeyboard::g910(layout.clone())));
        for model in LedRectModel::ALL {
            registry.register(Arc::new(LedRectKeyboard::new(*model, layout.clone())));
        }
        registry
    }

    /// Register a backend; replaces any backend with the same slug
    pub fn register(&mut self, device: Arc<dyn KeyboardProvider>) {
        self.by_slug.insert(device.slug().to_string(), device);
    }

    /// Find a backend by slug
    pub fn find(&self, slug: &str) -> Option<Arc<dyn KeyboardProvider>> {
        self.by_slug.get(slug).cloned()
    }

    /// Find a backend by slug, as an error when missing
    pub fn get(&self, slug: &str) -> Result<Arc<dyn KeyboardProvider>, DeviceError> {
        self.find(slug)
            .ok_or_else(|| DeviceError::NotFound(slug.to_string()))
    }

    /// All registered backends, sorted by slug
    pub fn all(&self) -> Vec<Arc<dyn KeyboardProvider>> {
        self.by_slug.values().cloned().collect()
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.by_slug.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::with_builtins(&KeyboardLayout::qwerty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_builtins() {
        let registry = DeviceRegistry::default();
        assert_eq!(registry.len(), 6);

        let g810 = registry.find("logitech-g810").unwrap();
        assert_eq!(g810.width(), 21);
        assert_eq!(g810.height(), 6);

        let k95 = registry.find("corsair-k95-rgb").unwrap();
        assert_eq!(k95.width(), 25);
    }

    #[test]
    fn test_missing_slug() {
        let registry = DeviceRegistry::default();
        assert!(registry.find("razer-blackwidow").is_none());
        assert!(matches!(
            registry.get("razer-blackwidow"),
            Err(DeviceError::NotFound(_))
        ));
    }

    #[test]
    fn test_slugs_sorted() {
        let registry = DeviceRegistry::default();
        let slugs = registry.slugs();
        let mut sorted = slugs.clone();
        sorted.sort();
        assert_eq!(slugs, sorted);
    }
}
