//! Headless rendering: `render` writes a PNG, `run` drives the device until
//! Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use keyglow::device::KeyCode;
use keyglow::engine::spawn_output;
use tracing::{info, warn};

use super::{shutdown_on_interrupt, AppContext, CommandResult};

/// Parse a key given on the command line: a name ("Space", "G") or a
/// single typed character (";")
pub fn parse_key(arg: &str) -> Option<KeyCode> {
    KeyCode::from_name(arg).or_else(|| {
        let mut chars = arg.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => KeyCode::from_char(ch),
            _ => None,
        }
    })
}

pub fn render(
    ctx: &AppContext,
    game: &str,
    name: &str,
    ticks: u32,
    out: &Path,
    data: Option<&Path>,
    presses: &[String],
) -> CommandResult {
    let keys = presses
        .iter()
        .map(|arg| parse_key(arg).ok_or_else(|| format!("unknown key '{arg}'")))
        .collect::<Result<Vec<_>, _>>()?;

    let engine = ctx.start_engine(game, name, data, None)?;
    let period = engine.config().tick_period();
    let hook = engine.key_press_hook();

    let mut last = None;
    for tick in 0..ticks.max(1) {
        // Layers drop presses that arrive before their first update
        if tick == 1 {
            for key in &keys {
                hook.key_down(*key);
            }
        }
        last = engine.tick_with(period);
    }
    let frame = last.ok_or("engine produced no frame")?;

    if let Err(e) = frame.write_to_device() {
        warn!("device write failed: {e}");
    }
    frame.keyboard.save(out)?;
    println!(
        "Wrote {} ({}x{}, tick {}) for {}",
        out.display(),
        frame.keyboard.width(),
        frame.keyboard.height(),
        frame.tick,
        frame.device.name()
    );
    engine.disable_device();
    Ok(())
}

pub async fn run(ctx: &AppContext, game: &str, name: &str, data: Option<&Path>) -> CommandResult {
    let engine = ctx.start_engine(game, name, data, None)?;
    let shutdown = shutdown_on_interrupt();
    let writer = spawn_output(engine.subscribe());

    println!("Rendering '{name}'. Ctrl+C to stop.");
    Arc::clone(&engine).run(shutdown).await;

    info!("stopping after {} ticks", engine.ticks());
    engine.disable_device();
    writer.abort();
    println!("Done.");
    Ok(())
}
