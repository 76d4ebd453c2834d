//! Command handlers for the CLI application.
//!
//! - `devices`: builtin device listing
//! - `profile`: profile store commands (list, show, demo, delete)
//! - `render`: headless rendering to PNG and the Ctrl-C bound run loop
//! - `preview`: live terminal preview

pub mod devices;
pub mod preview;
pub mod profile;
pub mod render;

use std::path::Path;
use std::sync::Arc;

use keyglow::device::{DeviceRegistry, KeyboardProvider};
use keyglow::{Config, DataModel, JsonProfileStore, ProfileModel, ProfileStore, RenderEngine};
use tokio::sync::watch;
use tracing::{debug, info};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs, built once from the config
pub struct AppContext {
    pub config: Config,
    pub registry: DeviceRegistry,
    pub store: JsonProfileStore,
    device_slug: String,
}

impl AppContext {
    pub fn new(config: Config, device_override: Option<String>) -> Self {
        let registry = DeviceRegistry::with_builtins(&config.keyboard_layout());
        let store = JsonProfileStore::new(config.profiles_dir());
        let device_slug = device_override.unwrap_or_else(|| config.device.clone());
        debug!("profiles in {}", store.root().display());
        Self {
            config,
            registry,
            store,
            device_slug,
        }
    }

    /// The selected device backend
    pub fn device(&self) -> Result<Arc<dyn KeyboardProvider>, Box<dyn std::error::Error>> {
        self.registry.get(&self.device_slug).map_err(|e| {
            format!("{e} (available: {})", self.registry.slugs().join(", ")).into()
        })
    }

    pub fn load_profile(
        &self,
        game: &str,
        device: &dyn KeyboardProvider,
        name: &str,
    ) -> Result<ProfileModel, Box<dyn std::error::Error>> {
        let profile = self.store.load(game, device.slug(), name)?;
        info!("loaded profile '{}' ({} layers)", profile.name, profile.len());
        Ok(profile)
    }

    /// Engine with the profile active on the selected device and data
    /// values preloaded
    pub fn start_engine(
        &self,
        game: &str,
        name: &str,
        data: Option<&Path>,
        tick_rate_hz: Option<u32>,
    ) -> Result<Arc<RenderEngine>, Box<dyn std::error::Error>> {
        let device = self.device()?;
        let profile = self.load_profile(game, device.as_ref(), name)?;

        let mut engine_config = self.config.engine();
        if let Some(hz) = tick_rate_hz {
            engine_config.tick_rate_hz = hz.clamp(1, 120);
        }
        let engine = Arc::new(RenderEngine::new(engine_config));
        if let Some(path) = data {
            let values = DataModel::load(path).map_err(|e| format!("load data: {e}"))?;
            info!("{} data values from {}", values.len(), path.display());
            *engine.data_model().write() = values;
        }
        engine.activate(device, profile.into_shared())?;
        Ok(engine)
    }
}

/// Watch channel that turns true on Ctrl-C
pub fn shutdown_on_interrupt() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        tx.send(true).ok();
    })
    .ok();
    rx
}
