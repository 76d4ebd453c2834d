// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyglow")]
#[command(author, version, about = "Layered per-key keyboard lighting")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.config/keyglow/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG wins
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Device slug, overriding the config file
    #[arg(long, global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List builtin devices
    #[command(visible_alias = "ls")]
    Devices,

    /// Manage stored profiles
    #[command(subcommand, visible_alias = "p")]
    Profile(ProfileCommands),

    /// Render a profile headless and save the last frame as PNG
    Render {
        /// Game the profile belongs to
        #[arg(long, short)]
        game: String,
        /// Profile name
        name: String,
        /// Number of ticks to run
        #[arg(long, default_value = "25")]
        ticks: u32,
        /// Output image
        #[arg(long, short, default_value = "frame.png")]
        out: PathBuf,
        /// JSON file with data model values
        #[arg(long)]
        data: Option<PathBuf>,
        /// Keys pressed after the first tick (e.g. G, Space, ";")
        #[arg(long = "press", value_name = "KEY")]
        presses: Vec<String>,
    },

    /// Drive the device with a profile until Ctrl-C
    Run {
        #[arg(long, short)]
        game: String,
        name: String,
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Live terminal preview; typed keys act as key presses
    #[command(visible_alias = "pv")]
    Preview {
        #[arg(long, short)]
        game: String,
        name: String,
        /// Ticks per second (default: config tick rate)
        #[arg(long)]
        fps: Option<u32>,
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List profiles for a game on the selected device
    List {
        #[arg(long, short)]
        game: String,
    },

    /// Print a profile's layer tree
    Show {
        #[arg(long, short)]
        game: String,
        name: String,
        /// Print the stored JSON instead of the tree
        #[arg(long)]
        json: bool,
    },

    /// Write the builtin demo profile
    Demo {
        #[arg(long, short)]
        game: String,
        #[arg(default_value = "Demo")]
        name: String,
        /// Overwrite an existing profile
        #[arg(long)]
        force: bool,
    },

    /// Delete a profile
    #[command(visible_alias = "rm")]
    Delete {
        #[arg(long, short)]
        game: String,
        name: String,
    },
}
