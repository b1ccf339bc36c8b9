//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, TwinkleStrategy};

/// Starwatch command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "starwatch", about = "Animated starfield and near-Earth object tracker")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Seed for the starfield generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Twinkle strategy for every layer (shader, host).
    #[arg(long)]
    pub twinkle: Option<TwinkleStrategy>,

    /// Port for the local page server.
    #[arg(long)]
    pub port: Option<u16>,

    /// NeoWs API key.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Serve the page without opening the starfield window.
    #[arg(long)]
    pub no_window: bool,

    /// Print today's near-Earth objects as a table and exit.
    #[arg(long)]
    pub print_neo: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(seed) = args.seed {
            self.starfield.seed = Some(seed);
        }
        if let Some(strategy) = args.twinkle {
            self.starfield.set_twinkle_strategy(strategy);
        }
        if let Some(port) = args.port {
            self.feed.port = port;
        }
        if let Some(ref key) = args.api_key {
            self.feed.api_key = key.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
