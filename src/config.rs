//! User configuration
//!
//! Stored as TOML under the platform config directory. Every field has a
//! default, so a partial (or missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use keyglow_device::KeyboardLayout;

use crate::engine::EngineConfig;

const TICK_RATE_RANGE: (u32, u32) = (1, 120);
const RENDER_SCALE_RANGE: (u32, u32) = (1, 16);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine ticks per second
    pub tick_rate_hz: u32,
    /// Raster pixels per keyboard unit
    pub render_scale: u32,
    /// Slug of the device to drive
    pub device: String,
    /// Key layout name ("qwerty" or "azerty")
    pub layout: String,
    /// Where profiles are stored; defaults next to the config file
    pub profiles_dir: Option<PathBuf>,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: 25,
            render_scale: 4,
            device: "logitech-g810".to_string(),
            layout: "qwerty".to_string(),
            profiles_dir: None,
            log_level: "info".to_string(),
        }
    }
}

fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keyglow")
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        config_root().join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config.sanitized())
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp numeric fields into their supported ranges
    pub fn sanitized(mut self) -> Self {
        self.tick_rate_hz = self.tick_rate_hz.clamp(TICK_RATE_RANGE.0, TICK_RATE_RANGE.1);
        self.render_scale = self
            .render_scale
            .clamp(RENDER_SCALE_RANGE.0, RENDER_SCALE_RANGE.1);
        self
    }

    pub fn tick_period(&self) -> Duration {
        self.engine().tick_period()
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            tick_rate_hz: self.tick_rate_hz,
            render_scale: self.render_scale,
        }
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.profiles_dir
            .clone()
            .unwrap_or_else(|| config_root().join("profiles"))
    }

    /// Key layout by name; unknown names fall back to qwerty
    pub fn keyboard_layout(&self) -> KeyboardLayout {
        KeyboardLayout::from_name(&self.layout).unwrap_or_else(|| {
            tracing::warn!("unknown layout '{}', using qwerty", self.layout);
            KeyboardLayout::qwerty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tick_period(), Duration::from_millis(40));
        assert_eq!(config.render_scale, 4);
        assert_eq!(config.device, "logitech-g810");
        assert!(config.profiles_dir().ends_with("keyglow/profiles"));
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml("tick_rate_hz = 60\nlayout = \"azerty\"").unwrap();
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.render_scale, 4);
        assert_eq!(config.keyboard_layout().name(), "azerty");
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let config = Config::from_toml("tick_rate_hz = 0\nrender_scale = 100").unwrap();
        assert_eq!(config.tick_rate_hz, 1);
        assert_eq!(config.render_scale, 16);
    }

    #[test]
    fn test_unknown_layout_falls_back() {
        let config = Config {
            layout: "dvorak".to_string(),
            ..Config::default()
        };
        assert_eq!(config.keyboard_layout().name(), "qwerty");
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(Config::from_toml("tick_rate_hz = \"fast\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        let config = Config {
            device: "corsair-k70-rgb".to_string(),
            profiles_dir: Some(dir.path().join("profiles")),
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
