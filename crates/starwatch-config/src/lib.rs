//! Configuration for Starwatch.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and
//! tolerate missing or unknown fields.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    APP_DIR_NAME, Config, DebugConfig, FeedConfig, LayerConfig, StarfieldConfig, TwinkleStrategy,
    WindowConfig,
};
pub use error::ConfigError;
