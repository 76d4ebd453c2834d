//! Key-down hook.
//!
//! Whatever observes the keyboard (an OS hook thread, the terminal preview)
//! holds a [`KeyPressHook`] and posts key codes; the engine owns the
//! matching [`KeyPressQueue`] and drains it once at the start of each tick.

use keyglow_device::KeyCode;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

/// Sending half; cheap to clone and usable from any thread
#[derive(Clone)]
pub struct KeyPressHook {
    tx: mpsc::UnboundedSender<KeyCode>,
}

impl KeyPressHook {
    /// Report a key-down. Returns `false` once the engine is gone.
    pub fn key_down(&self, key: KeyCode) -> bool {
        trace!("key down {key}");
        self.tx.send(key).is_ok()
    }
}

/// Receiving half, drained by the tick
pub struct KeyPressQueue {
    rx: Mutex<mpsc::UnboundedReceiver<KeyCode>>,
}

impl KeyPressQueue {
    /// Everything posted since the last drain, in arrival order
    pub fn drain(&self) -> Vec<KeyCode> {
        let mut rx = self.rx.lock();
        let mut keys = Vec::new();
        while let Ok(key) = rx.try_recv() {
            keys.push(key);
        }
        keys
    }
}

pub fn key_press_channel() -> (KeyPressHook, KeyPressQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        KeyPressHook { tx },
        KeyPressQueue {
            rx: Mutex::new(rx),
        },
    )
}
