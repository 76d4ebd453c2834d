//! `devices` command

use keyglow::device::KeyboardProviderExt;

use super::{AppContext, CommandResult};

/// List builtin devices, marking the selected one
pub fn list(ctx: &AppContext) -> CommandResult {
    let selected = ctx.device().ok().map(|d| d.slug().to_string());

    println!("{:<2}{:<22} {:<24} {:<6} Preview", "", "Slug", "Name", "Grid");
    println!("{}", "-".repeat(64));
    for device in ctx.registry.all() {
        let marker = if selected.as_deref() == Some(device.slug()) {
            "*"
        } else {
            ""
        };
        let preview = device.preview_settings();
        println!(
            "{:<2}{:<22} {:<24} {:<6} {}x{}",
            marker,
            device.slug(),
            device.name(),
            format!("{}x{}", device.width(), device.height()),
            preview.width,
            preview.height
        );
    }
    if let Ok(device) = ctx.device() {
        println!();
        println!("Selected: {}", device.description());
    }
    Ok(())
}
