//! Terminal preview of a running profile using crossterm.
//!
//! Shows the device grid in an alternate screen with true-color cells.
//! The engine and the device writer run as background tasks; typed
//! characters are fed to the engine as key-down events.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    cursor,
    event::{Event, EventStream, KeyCode as TermKey, KeyEvent, KeyEventKind, KeyModifiers},
    style::{self, Color as TermColor, Stylize},
    terminal, ExecutableCommand, QueueableCommand,
};
use futures::StreamExt;
use image::RgbaImage;
use keyglow_device::{KeyCode, KeyboardProvider};
use tokio::sync::watch;

use crate::brush::Color;
use crate::engine::{spawn_output, Frame, RenderEngine};

/// Width of each cell in characters
const CELL_W: usize = 4;

/// What a terminal key event means to the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    Quit,
    Press(KeyCode),
    Ignore,
}

/// Map a terminal key event. Esc and Ctrl-C quit; every other printable
/// key is a key-down on the keyboard.
pub fn action_for(key: &KeyEvent) -> PreviewAction {
    if key.kind == KeyEventKind::Release {
        return PreviewAction::Ignore;
    }
    match key.code {
        TermKey::Esc => PreviewAction::Quit,
        TermKey::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PreviewAction::Quit,
        TermKey::Char(ch) => KeyCode::from_char(ch).map_or(PreviewAction::Ignore, PreviewAction::Press),
        TermKey::Enter => PreviewAction::Press(KeyCode::ENTER),
        TermKey::Tab => PreviewAction::Press(KeyCode::TAB),
        TermKey::Backspace => PreviewAction::Press(KeyCode::BACKSPACE),
        _ => PreviewAction::Ignore,
    }
}

/// 3-char key labels per grid cell, row-major
pub fn build_labels(device: &dyn KeyboardProvider) -> Vec<String> {
    let (w, h) = (device.width() as i32, device.height() as i32);
    let mut labels = vec![String::new(); (w * h).max(0) as usize];
    for code in 0..=u8::MAX {
        let key = KeyCode(code);
        let (Some(pos), Some(name)) = (device.get_key_position(key), key.name()) else {
            continue;
        };
        if (0..w).contains(&pos.x) && (0..h).contains(&pos.y) {
            labels[(pos.y * w + pos.x) as usize] = name.chars().take(3).collect();
        }
    }
    labels
}

/// Color at the center of every grid cell of a raster, row-major
pub fn sample_cells(image: &RgbaImage, grid_w: u32, grid_h: u32) -> Vec<Color> {
    let (iw, ih) = image.dimensions();
    if grid_w == 0 || grid_h == 0 || iw < grid_w || ih < grid_h {
        return Vec::new();
    }
    let (sx, sy) = (iw / grid_w, ih / grid_h);
    let mut cells = Vec::with_capacity((grid_w * grid_h) as usize);
    for y in 0..grid_h {
        for x in 0..grid_w {
            cells.push((*image.get_pixel(x * sx + sx / 2, y * sy + sy / 2)).into());
        }
    }
    cells
}

/// Run the preview until Esc or Ctrl-C. The engine must already have an
/// active device and profile.
pub async fn run(engine: Arc<RenderEngine>, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    let active = engine.active().ok_or("no active device")?;
    let labels = build_labels(active.device.as_ref());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = tokio::spawn(Arc::clone(&engine).run(shutdown_rx));
    let writer = spawn_output(engine.subscribe());

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout
        .execute(terminal::EnterAlternateScreen)?
        .execute(cursor::Hide)?;

    let result = run_loop(&mut stdout, &engine, title, &labels).await;

    // Cleanup
    stdout
        .execute(cursor::Show)?
        .execute(terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    shutdown_tx.send(true).ok();
    ticker.await?;
    writer.abort();
    result
}

async fn run_loop(
    stdout: &mut io::Stdout,
    engine: &RenderEngine,
    title: &str,
    labels: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frames = engine.subscribe();
    let mut events = EventStream::new();
    let hook = engine.key_press_hook();
    let mut presses = 0u64;

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                if let Event::Key(key) = event? {
                    match action_for(&key) {
                        PreviewAction::Quit => break,
                        PreviewAction::Press(code) => {
                            hook.key_down(code);
                            presses += 1;
                        }
                        PreviewAction::Ignore => {}
                    }
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    draw(stdout, &frame, title, labels, presses)?;
                }
            }
        }
    }
    Ok(())
}

fn draw(
    stdout: &mut io::Stdout,
    frame: &Frame,
    title: &str,
    labels: &[String],
    presses: u64,
) -> io::Result<()> {
    let (w, h) = (frame.device.width(), frame.device.height());
    let cells = sample_cells(&frame.keyboard, w, h);

    // Header
    stdout.queue(cursor::MoveTo(0, 0))?;
    stdout.queue(style::PrintStyledContent(
        format!(
            " {}  |  {}  |  tick {:6}  |  Esc to quit ",
            title,
            frame.device.name(),
            frame.tick
        )
        .with(TermColor::White)
        .on(TermColor::DarkGrey),
    ))?;

    for y in 0..h {
        stdout.queue(cursor::MoveTo(0, (y + 2) as u16))?;
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let color = cells.get(idx).copied().unwrap_or(Color::BLACK);
            let label = labels.get(idx).map(String::as_str).unwrap_or("");
            let lum = (u16::from(color.r) + u16::from(color.g) + u16::from(color.b)) / 3;
            let fg = if lum > 128 {
                TermColor::Black
            } else {
                TermColor::Grey
            };
            let bg = TermColor::Rgb {
                r: color.r,
                g: color.g,
                b: color.b,
            };
            stdout.queue(style::PrintStyledContent(
                format!("{:^width$}", label, width = CELL_W).with(fg).on(bg),
            ))?;
        }
    }

    stdout.queue(cursor::MoveTo(0, (h + 3) as u16))?;
    stdout.queue(style::Print(format!(" key presses: {presses} ")))?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use image::Rgba;
    use keyglow_device::{GridKeyboard, KeyboardLayout};

    fn key(code: TermKey, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_actions() {
        assert_eq!(action_for(&key(TermKey::Esc, KeyModifiers::NONE)), PreviewAction::Quit);
        assert_eq!(
            action_for(&key(TermKey::Char('c'), KeyModifiers::CONTROL)),
            PreviewAction::Quit
        );
        assert_eq!(
            action_for(&key(TermKey::Char('q'), KeyModifiers::NONE)),
            PreviewAction::Press(KeyCode::Q)
        );
        assert_eq!(
            action_for(&key(TermKey::Char(';'), KeyModifiers::NONE)),
            PreviewAction::Press(KeyCode::SEMICOLON)
        );
        assert_eq!(action_for(&key(TermKey::F(5), KeyModifiers::NONE)), PreviewAction::Ignore);
    }

    #[test]
    fn test_release_ignored() {
        let mut ev = key(TermKey::Char('a'), KeyModifiers::NONE);
        ev.kind = KeyEventKind::Release;
        assert_eq!(action_for(&ev), PreviewAction::Ignore);
    }

    #[test]
    fn test_labels_follow_layout() {
        let kb = GridKeyboard::g810(KeyboardLayout::qwerty());
        let labels = build_labels(&kb);
        assert_eq!(labels.len(), 21 * 6);
        let pos = kb.get_key_position(KeyCode::A).unwrap();
        assert_eq!(labels[(pos.y * 21 + pos.x) as usize], "A");
    }

    #[test]
    fn test_sample_cells_uses_centers() {
        let mut img = RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 255]));
        img.put_pixel(6, 2, Rgba([255, 0, 0, 255]));
        let cells = sample_cells(&img, 2, 1);
        assert_eq!(cells, vec![Color::BLACK, Color::rgb(255, 0, 0)]);
        assert!(sample_cells(&img, 0, 1).is_empty());
    }
}
