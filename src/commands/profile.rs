//! `profile` subcommands

use keyglow::profile::demo::demo_profile;
use keyglow::{ProfileModel, ProfileStore};

use super::{AppContext, CommandResult};

pub fn list(ctx: &AppContext, game: &str) -> CommandResult {
    let device = ctx.device()?;
    let names = ctx.store.list(game, device.slug())?;
    if names.is_empty() {
        println!("No profiles for '{game}' on {}", device.name());
        return Ok(());
    }
    println!("Profiles for '{game}' on {}:", device.name());
    for name in names {
        println!("  - {name}");
    }
    Ok(())
}

pub fn show(ctx: &AppContext, game: &str, name: &str, json: bool) -> CommandResult {
    let device = ctx.device()?;
    let profile = ctx.load_profile(game, device.as_ref(), name)?;
    if json {
        println!("{}", profile.to_json()?);
        return Ok(());
    }

    println!(
        "Profile: {}  (game: {}, device: {})",
        profile.name, profile.game_name, profile.keyboard_slug
    );
    println!(
        "File:    {}",
        ctx.store.path(game, device.slug(), name).display()
    );
    println!();
    print_tree(&profile);
    Ok(())
}

fn print_tree(profile: &ProfileModel) {
    for id in profile.walk_pre_order() {
        let Some(layer) = profile.layer(id) else {
            continue;
        };
        let indent = "  ".repeat(profile.depth(id));
        let props = &layer.properties;
        let state = if layer.enabled { "" } else { " (disabled)" };
        println!(
            "{indent}[{}] {} <{}> {}x{} at ({}, {}) opacity {:.2} {}{state}",
            layer.order,
            layer.name,
            layer.kind.name(),
            props.width,
            props.height,
            props.x,
            props.y,
            props.opacity,
            layer.animation.name(),
        );
        for condition in &props.conditions {
            println!("{indent}    if {condition}");
        }
    }
}

pub fn demo(ctx: &AppContext, game: &str, name: &str, force: bool) -> CommandResult {
    let device = ctx.device()?;
    let path = ctx.store.path(game, device.slug(), name);
    if path.exists() && !force {
        return Err(format!("{} exists (use --force to overwrite)", path.display()).into());
    }
    let profile = demo_profile(name, game, device.as_ref());
    ctx.store.save(&profile)?;
    println!("Wrote {} ({} layers)", path.display(), profile.len());
    Ok(())
}

pub fn delete(ctx: &AppContext, game: &str, name: &str) -> CommandResult {
    let device = ctx.device()?;
    if ctx.store.delete(game, device.slug(), name)? {
        println!("Deleted '{name}'");
    } else {
        println!("No profile '{name}' for '{game}' on {}", device.name());
    }
    Ok(())
}
