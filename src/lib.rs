/// # imgdrop
///
/// A single-threaded image drop server. Clients POST raw image bytes (named by a
/// `Content-Disposition` filename) and GET them back from the upload directory.
///
/// The `run` function parses the command line, loads configuration, sets up logging
/// and serves until the process is stopped.
pub mod accumulator;
pub mod cli;
pub mod config;
pub mod error;
pub mod fileserver;
pub mod frame;
pub mod http;
pub mod observer;
pub mod response;
pub mod router;
pub mod server;
pub mod storage;
pub mod upload;

use crate::cli::Cli;
use crate::config::Config;
use clap::Parser;
use log::error;

/// Initializes the logger, parses command-line arguments, and starts the server.
///
/// Configuration or startup failures are logged and the process exits with status 1.
pub fn run() {
    let cli = Cli::parse();

    // Load configuration with precedence: CLI > INI > Defaults
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let log_level = if config.verbose {
        "debug"
    } else if config.detailed_logging {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::debug!("Log level set to: {log_level}");

    if config.verbose {
        config.print_summary();
    }

    if let Err(e) = server::run_server(config, None, None) {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
