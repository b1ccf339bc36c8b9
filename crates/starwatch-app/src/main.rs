//! The binary entry point for Starwatch.

mod frame_clock;
mod window;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use starwatch_config::{CliArgs, Config};
use starwatch_feed::{FeedServer, NeoFeedClient, PageState};
use starwatch_log::init_logging;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(Config::default_dir);
    let mut config = match &config_dir {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config from {}: {e}", dir.display());
            Config::default()
        }),
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);

    let log_dir = log_dir(config_dir.as_ref());
    init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));
    info!("Starwatch v{}", env!("CARGO_PKG_VERSION"));

    if args.print_neo {
        return print_neo(&NeoFeedClient::from_config(&config.feed));
    }

    let mut feed_server = if config.feed.enabled {
        let mut server = FeedServer::from_config(&config.feed);
        match server.start(NeoFeedClient::from_config(&config.feed)) {
            Ok(()) => {
                info!(
                    "Asteroid tracker at http://{}:{}/",
                    config.feed.listen_address,
                    server.actual_port()
                );
                Some(server)
            }
            Err(e) => {
                error!("Failed to start feed server: {e}");
                None
            }
        }
    } else {
        None
    };

    if args.no_window {
        let Some(server) = feed_server.as_mut() else {
            error!("Nothing to run: --no-window given and the feed server is not running");
            return ExitCode::FAILURE;
        };
        if let Err(e) = server.wait() {
            error!("Feed server exited abnormally: {e}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    if let Err(e) = window::run(config, config_dir, args) {
        error!("Event loop failed: {e}");
        return ExitCode::FAILURE;
    }

    if let Some(mut server) = feed_server
        && let Err(e) = server.stop()
    {
        warn!("Feed server shutdown failed: {e}");
    }
    ExitCode::SUCCESS
}

/// One fetch rendered for the terminal, with the page's states and messages.
fn print_neo(client: &NeoFeedClient) -> ExitCode {
    eprint!("{}", PageState::Loading.render_text());
    let page = PageState::from_result(client.fetch_today());
    if let PageState::Error(cause) = &page {
        error!("Near-Earth object feed unavailable: {cause}");
    }
    print!("{}", page.render_text());
    if page.table().is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Log files live next to the config file.
fn log_dir(config_dir: Option<&PathBuf>) -> Option<PathBuf> {
    config_dir
        .map(|dir| dir.join("logs"))
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join("starwatch").join("logs")))
}
