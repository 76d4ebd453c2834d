//! Profile persistence.
//!
//! [`JsonProfileStore`] keeps one pretty-printed JSON file per profile at
//! `<root>/<game>/<keyboard-slug>/<name>.json`. Loaded profiles are
//! validated before they are handed to the engine.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::{ProfileError, ProfileModel};

/// Error type for profile loading and saving
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid profile: {0}")]
    Invalid(#[from] ProfileError),

    #[error("profile not found: {0}")]
    NotFound(String),
}

/// Storage for profiles keyed by (game, keyboard slug, name)
pub trait ProfileStore: Send + Sync {
    fn load(&self, game: &str, keyboard_slug: &str, name: &str) -> Result<ProfileModel, LoadError>;

    fn save(&self, profile: &ProfileModel) -> Result<(), LoadError>;

    /// Profile names for a (game, keyboard) pair, sorted
    fn list(&self, game: &str, keyboard_slug: &str) -> Result<Vec<String>, LoadError>;

    /// Returns `false` when there was nothing to delete
    fn delete(&self, game: &str, keyboard_slug: &str, name: &str) -> Result<bool, LoadError>;
}

impl ProfileModel {
    /// Parse and validate a profile
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let mut profile: ProfileModel = serde_json::from_str(json)?;
        profile.validate()?;
        profile.reserve_ids();
        profile.setup_layers();
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct JsonProfileStore {
    root: PathBuf,
}

impl JsonProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, game: &str, keyboard_slug: &str) -> PathBuf {
        self.root
            .join(sanitize(game))
            .join(sanitize(keyboard_slug))
    }

    /// File a profile is stored in
    pub fn path(&self, game: &str, keyboard_slug: &str, name: &str) -> PathBuf {
        self.dir(game, keyboard_slug)
            .join(format!("{}.json", sanitize(name)))
    }
}

impl ProfileStore for JsonProfileStore {
    fn load(&self, game: &str, keyboard_slug: &str, name: &str) -> Result<ProfileModel, LoadError> {
        let path = self.path(game, keyboard_slug, name);
        if !path.is_file() {
            return Err(LoadError::NotFound(format!("{game}/{keyboard_slug}/{name}")));
        }
        let content = std::fs::read_to_string(&path)?;
        let profile = ProfileModel::from_json(&content)?;
        debug!("loaded profile from {}", path.display());
        Ok(profile)
    }

    fn save(&self, profile: &ProfileModel) -> Result<(), LoadError> {
        profile.validate()?;
        let path = self.path(&profile.game_name, &profile.keyboard_slug, &profile.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, profile.to_json()?)?;
        debug!("saved profile to {}", path.display());
        Ok(())
    }

    fn list(&self, game: &str, keyboard_slug: &str) -> Result<Vec<String>, LoadError> {
        let dir = self.dir(game, keyboard_slug);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => names.push(stem.to_string()),
                    None => warn!("skipping profile with non-UTF-8 name: {}", path.display()),
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, game: &str, keyboard_slug: &str, name: &str) -> Result<bool, LoadError> {
        let path = self.path(game, keyboard_slug, name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Make a name safe to use as a single path component
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{AnimationPolicy, LayerType};
    use tempfile::TempDir;

    fn sample() -> ProfileModel {
        let mut p = ProfileModel::new("Default", "logitech-g810", "CS:GO");
        let folder = p.add_layer_of(None, LayerType::Folder, "Group");
        let inner = p.add_layer(Some(folder));
        p.layer_mut(inner).unwrap().animation = AnimationPolicy::Pulse;
        p.layer_mut(inner).unwrap().properties.x = 4;
        p.add_layer_of(None, LayerType::key_press(), "Keys");
        p
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("CS:GO"), "CS_GO");
        assert_eq!(sanitize("../etc"), "_etc");
        assert_eq!(sanitize(".."), "_");
        assert_eq!(sanitize("My profile"), "My profile");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::new(dir.path());
        let profile = sample();
        store.save(&profile).unwrap();

        let loaded = store.load("CS:GO", "logitech-g810", "Default").unwrap();
        assert_eq!(loaded.roots(), profile.roots());
        assert_eq!(loaded.walk_pre_order(), profile.walk_pre_order());
        for id in profile.walk_pre_order() {
            let (a, b) = (profile.layer(id).unwrap(), loaded.layer(id).unwrap());
            assert_eq!(a.order, b.order);
            assert_eq!(a.properties, b.properties);
            assert_eq!(a.animation, b.animation);
            assert_eq!(a.kind.name(), b.kind.name());
        }
    }

    #[test]
    fn test_loaded_profile_allocates_fresh_ids() {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::new(dir.path());
        store.save(&sample()).unwrap();
        let mut loaded = store.load("CS:GO", "logitech-g810", "Default").unwrap();
        let before = loaded.len();
        let id = loaded.add_layer(None);
        assert_eq!(loaded.len(), before + 1);
        loaded.validate().unwrap();
        assert!(loaded.layer(id).is_some());
    }

    #[test]
    fn test_list_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::new(dir.path());
        assert!(store.list("CS:GO", "logitech-g810").unwrap().is_empty());

        let mut p = sample();
        store.save(&p).unwrap();
        p.name = "Alt".into();
        store.save(&p).unwrap();
        assert_eq!(
            store.list("CS:GO", "logitech-g810").unwrap(),
            vec!["Alt".to_string(), "Default".to_string()]
        );

        assert!(store.delete("CS:GO", "logitech-g810", "Alt").unwrap());
        assert!(!store.delete("CS:GO", "logitech-g810", "Alt").unwrap());
        assert_eq!(store.list("CS:GO", "logitech-g810").unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::new(dir.path());
        assert!(matches!(
            store.load("CS:GO", "logitech-g810", "Nope"),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_rejects_corrupted_tree() {
        let dir = TempDir::new().unwrap();
        let store = JsonProfileStore::new(dir.path());
        let profile = sample();
        let mut json: serde_json::Value = serde_json::from_str(&profile.to_json().unwrap()).unwrap();
        json["layers"][0]["order"] = serde_json::json!(7);
        let path = store.path("CS:GO", "logitech-g810", "Default");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(
            store.load("CS:GO", "logitech-g810", "Default"),
            Err(LoadError::Invalid(ProfileError::BadOrder { .. }))
        ));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        assert!(matches!(
            ProfileModel::from_json("{ not json"),
            Err(LoadError::Parse(_))
        ));
    }
}
