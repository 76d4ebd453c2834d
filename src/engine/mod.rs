//! Render engine: the fixed-rate tick that updates the active profile,
//! composites it and publishes the frame for the device writer.
//!
//! The active device and profile live in an [`ActiveContext`] swapped
//! atomically between ticks. A tick captures the context once and runs
//! against it to completion, so switching profiles or disabling the device
//! never affects a tick already in flight.

pub mod composite;
pub mod output;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use keyglow_device::{DeviceError, KeyboardProvider};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::data_model::DataModel;
use crate::editor::{draw_selection_overlay, SelectionHandle};
use crate::input::{key_press_channel, KeyPressHook, KeyPressQueue};
use crate::layer::UpdateContext;
use crate::profile::SharedProfile;

pub use output::spawn_output;

/// Tick cadence and raster resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub tick_rate_hz: u32,
    /// Raster pixels per keyboard unit
    pub render_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 25,
            render_scale: 4,
        }
    }
}

impl EngineConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

/// What the engine is currently driving
pub struct ActiveContext {
    pub device: Arc<dyn KeyboardProvider>,
    pub profile: SharedProfile,
}

/// One rendered tick
pub struct Frame {
    pub tick: u64,
    /// Device the frame was rendered for
    pub device: Arc<dyn KeyboardProvider>,
    /// Composited raster at `render_scale` pixels per unit
    pub keyboard: RgbaImage,
    /// Copy of `keyboard` with the selection overlay, while an editor is
    /// attached
    pub preview: Option<RgbaImage>,
}

impl Frame {
    /// Push the keyboard raster to the LEDs (blocking)
    pub fn write_to_device(&self) -> Result<(), DeviceError> {
        self.device.draw_bitmap(&self.keyboard)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("tick", &self.tick)
            .field("device", &self.device.slug())
            .field("keyboard", &self.keyboard.dimensions())
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

pub struct RenderEngine {
    config: EngineConfig,
    active: RwLock<Option<Arc<ActiveContext>>>,
    hook: KeyPressHook,
    queue: KeyPressQueue,
    data: Arc<RwLock<DataModel>>,
    editor: RwLock<Option<SelectionHandle>>,
    frames: watch::Sender<Option<Arc<Frame>>>,
    ticks: AtomicU64,
    last_tick: Mutex<Option<Instant>>,
}

impl RenderEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (hook, queue) = key_press_channel();
        let (frames, _) = watch::channel(None);
        Self {
            config,
            active: RwLock::new(None),
            hook,
            queue,
            data: Arc::new(RwLock::new(DataModel::new())),
            editor: RwLock::new(None),
            frames,
            ticks: AtomicU64::new(0),
            last_tick: Mutex::new(None),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    // ── Device and profile ───────────────────────────────────────────

    /// Enable `device` and start rendering `profile` on it. On failure the
    /// engine is left idle and the error carries the device's
    /// cannot-enable text.
    pub fn activate(
        &self,
        device: Arc<dyn KeyboardProvider>,
        profile: SharedProfile,
    ) -> Result<(), DeviceError> {
        if let Some(previous) = self.active.write().take() {
            if previous.device.slug() != device.slug() {
                previous.device.disable();
            }
        }

        if let Err(e) = device.enable() {
            warn!("could not enable {}: {e}", device.name());
            return Err(match e {
                DeviceError::CannotEnable(text) => DeviceError::CannotEnable(text),
                _ => DeviceError::CannotEnable(device.cant_enable_text().to_string()),
            });
        }

        let name = profile.lock().name.clone();
        info!("rendering profile '{name}' on {}", device.name());
        *self.active.write() = Some(Arc::new(ActiveContext { device, profile }));
        *self.last_tick.lock() = None;
        Ok(())
    }

    /// Swap the profile on the active device. Returns `false` when no
    /// device is active.
    pub fn switch_profile(&self, profile: SharedProfile) -> bool {
        let mut active = self.active.write();
        let Some(current) = active.as_ref() else {
            return false;
        };
        let name = profile.lock().name.clone();
        info!("switching to profile '{name}'");
        *active = Some(Arc::new(ActiveContext {
            device: Arc::clone(&current.device),
            profile,
        }));
        true
    }

    /// Stop rendering and disable the device. Ticks after this are no-ops.
    pub fn disable_device(&self) {
        let previous = self.active.write().take();
        if let Some(ctx) = previous {
            ctx.device.disable();
            info!("{} disabled", ctx.device.name());
        }
        self.frames.send_replace(None);
    }

    pub fn active(&self) -> Option<Arc<ActiveContext>> {
        self.active.read().clone()
    }

    // ── Editor, data and input ───────────────────────────────────────

    /// Render a preview with the selection overlay from now on. While an
    /// editor is attached layers ignore conditions and data bindings.
    pub fn attach_editor(&self, selection: SelectionHandle) {
        debug!("editor attached");
        *self.editor.write() = Some(selection);
    }

    pub fn detach_editor(&self) {
        debug!("editor detached");
        *self.editor.write() = None;
    }

    /// Live data read by conditions and dynamic properties
    pub fn data_model(&self) -> Arc<RwLock<DataModel>> {
        Arc::clone(&self.data)
    }

    /// Handle for posting key-down events from any thread
    pub fn key_press_hook(&self) -> KeyPressHook {
        self.hook.clone()
    }

    /// Receiver of published frames; holds the newest only
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.frames.subscribe()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Run one tick using wall-clock time since the previous tick
    pub fn tick(&self) -> Option<Arc<Frame>> {
        let now = Instant::now();
        let period = self.config.tick_period();
        let elapsed = match self.last_tick.lock().replace(now) {
            // A long stall should not fast-forward animations
            Some(last) => now.duration_since(last).min(period * 4),
            None => period,
        };
        self.tick_with(elapsed)
    }

    /// Run one tick advancing animations by `elapsed`. Returns the
    /// published frame, or `None` when nothing is active.
    pub fn tick_with(&self, elapsed: Duration) -> Option<Arc<Frame>> {
        // Presses with nothing to render into are dropped, not deferred
        let key_presses = self.queue.drain();
        let Some(ctx) = self.active() else {
            trace!(
                "tick skipped: no active device, {} key presses dropped",
                key_presses.len()
            );
            return None;
        };
        let selection = self.editor.read().as_ref().map(|handle| *handle.lock());
        let device = ctx.device.as_ref();

        let (keyboard, preview) = {
            let data = self.data.read();
            let mut profile = ctx.profile.lock();
            let update = UpdateContext {
                device,
                data: &data,
                key_presses: &key_presses,
                elapsed: elapsed.as_secs_f32(),
                is_preview: selection.is_some(),
            };
            composite::update_profile(&mut profile, &update);
            let canvas = composite::composite(&profile, device, self.config.render_scale);

            let preview = selection.map(|selected| {
                let mut copy = canvas.clone();
                let visible = selected.filter(|id| profile.is_visible(*id));
                if let Some(layer) = visible.and_then(|id| profile.layer(id)) {
                    draw_selection_overlay(&mut copy, layer);
                }
                copy.into_image()
            });
            (canvas.into_image(), preview)
        };

        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = Arc::new(Frame {
            tick,
            device: Arc::clone(&ctx.device),
            keyboard,
            preview,
        });
        trace!("tick {tick}: {} key presses", key_presses.len());
        self.frames.send_replace(Some(Arc::clone(&frame)));
        Some(frame)
    }

    /// Tick at the configured rate until `shutdown` turns true or its
    /// sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.tick_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("render loop started at {} Hz", self.config.tick_rate_hz);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("render loop stopped after {} ticks", self.ticks());
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
