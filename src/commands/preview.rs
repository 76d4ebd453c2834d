//! `preview` command

use std::path::Path;

use super::{AppContext, CommandResult};

pub async fn preview(
    ctx: &AppContext,
    game: &str,
    name: &str,
    fps: Option<u32>,
    data: Option<&Path>,
) -> CommandResult {
    let engine = ctx.start_engine(game, name, data, fps)?;
    let title = format!("{game} / {name}");
    let result = keyglow::preview::run(engine.clone(), &title).await;
    engine.disable_device();
    result
}
