// Device writer task
// Pushes the newest published frame to its device on a blocking worker

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::Frame;

/// Write frames as they are published. Frames arriving while a write is in
/// flight collapse into the newest one. The task ends when the engine
/// drops its sender.
pub fn spawn_output(mut frames: watch::Receiver<Option<Arc<Frame>>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let Some(frame) = frames.borrow_and_update().clone() else {
                continue;
            };
            if !frame.device.is_enabled() {
                trace!("dropping frame {}: device disabled", frame.tick);
                continue;
            }
            let tick = frame.tick;
            match tokio::task::spawn_blocking(move || frame.write_to_device()).await {
                Ok(Ok(())) => trace!("frame {tick} written"),
                Ok(Err(e)) => warn!("LED write error on frame {tick}: {e}"),
                Err(e) => warn!("LED writer failed: {e}"),
            }
        }
        debug!("device output stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RenderEngine;
    use crate::profile::ProfileModel;
    use keyglow_device::{GridKeyboard, KeyboardLayout, KeyboardProvider};
    use std::time::Duration;

    #[tokio::test]
    async fn test_output_writes_latest_frame() {
        let kb = Arc::new(GridKeyboard::g810(KeyboardLayout::qwerty()));
        let engine = RenderEngine::default();
        let handle = spawn_output(engine.subscribe());

        let profile = ProfileModel::new("p", "logitech-g810", "g").into_shared();
        engine.activate(kb.clone(), profile).unwrap();
        engine.tick_with(Duration::from_millis(40));

        for _ in 0..50 {
            if kb.output().frames_written() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(kb.output().frames_written() > 0);

        assert_eq!(kb.output().last_frame().unwrap().dimensions(), (21, 6));

        // Dropping the engine closes the channel and ends the task
        drop(engine);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_output_skips_disabled_device() {
        let kb = Arc::new(GridKeyboard::g810(KeyboardLayout::qwerty()));
        let engine = RenderEngine::default();
        let handle = spawn_output(engine.subscribe());

        let profile = ProfileModel::new("p", "logitech-g810", "g").into_shared();
        engine.activate(kb.clone(), profile).unwrap();
        let frame = engine.tick_with(Duration::from_millis(40)).unwrap();
        kb.disable();
        // Frame still references the device but it is off now
        assert!(!frame.device.is_enabled());

        drop(engine);
        handle.await.unwrap();
        assert!(kb.output().last_frame().is_none());
    }
}
