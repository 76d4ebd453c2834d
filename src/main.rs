//! keyglow CLI
//!
//! Manage lighting profiles and render them on keyboard backends.

use clap::Parser;
use tracing::debug;

use keyglow::Config;

// CLI definitions
mod cli;
use cli::{Cli, Commands, ProfileCommands};

// Command handlers
mod commands;
use commands::AppContext;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    // RUST_LOG, then --log-level, then the config file
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    debug!("config from {}", config_path.display());

    let ctx = AppContext::new(config, cli.device);

    match cli.command {
        Commands::Devices => commands::devices::list(&ctx)?,

        Commands::Profile(ProfileCommands::List { game }) => {
            commands::profile::list(&ctx, &game)?;
        }
        Commands::Profile(ProfileCommands::Show { game, name, json }) => {
            commands::profile::show(&ctx, &game, &name, json)?;
        }
        Commands::Profile(ProfileCommands::Demo { game, name, force }) => {
            commands::profile::demo(&ctx, &game, &name, force)?;
        }
        Commands::Profile(ProfileCommands::Delete { game, name }) => {
            commands::profile::delete(&ctx, &game, &name)?;
        }

        Commands::Render {
            game,
            name,
            ticks,
            out,
            data,
            presses,
        } => {
            commands::render::render(&ctx, &game, &name, ticks, &out, data.as_deref(), &presses)?;
        }
        Commands::Run { game, name, data } => {
            commands::render::run(&ctx, &game, &name, data.as_deref()).await?;
        }
        Commands::Preview {
            game,
            name,
            fps,
            data,
        } => {
            commands::preview::preview(&ctx, &game, &name, fps, data.as_deref()).await?;
        }
    }

    Ok(())
}
