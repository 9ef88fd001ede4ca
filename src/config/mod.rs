//! Configuration management for imgdrop
//! Supports INI files with CLI argument overrides

pub mod ini_parser;

use crate::accumulator::{DEFAULT_CHUNK_SIZE, Framing};
use crate::cli::Cli;
use crate::error::AppError;
use clap::ValueEnum;
use ini_parser::IniConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LISTEN: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 3500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Server settings
    pub listen: String,
    pub port: u16,
    pub chunk_size: usize,
    pub read_timeout_ms: u64,
    pub framing: Framing,

    // Storage settings
    pub root: PathBuf,
    pub upload_dir: String,
    pub public_host: String,
    pub confine_paths: bool,

    // Logging settings
    pub verbose: bool,
    pub detailed_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            framing: Framing::ShortRead,
            root: PathBuf::from("."),
            upload_dir: DEFAULT_UPLOAD_DIR.to_string(),
            public_host: format!("localhost:{DEFAULT_PORT}"),
            confine_paths: false,
            verbose: false,
            detailed_logging: false,
        }
    }
}

impl Config {
    /// Load configuration with precedence: CLI args > INI file > Defaults
    pub fn load(cli: &Cli) -> Result<Self, AppError> {
        let ini = match Self::find_config_file(cli)? {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                IniConfig::load_file(&path).map_err(AppError::InvalidConfiguration)?
            }
            None => IniConfig::new(),
        };
        Self::from_sources(cli, &ini)
    }

    /// Merge an already parsed INI file under the CLI arguments.
    pub fn from_sources(cli: &Cli, ini: &IniConfig) -> Result<Self, AppError> {
        let defaults = Self::default();

        let port = cli
            .port
            .or_else(|| ini.get_u16("server", "port"))
            .unwrap_or(defaults.port);

        let framing = match cli.framing {
            Some(framing) => framing,
            None => match ini.get_string("server", "framing") {
                Some(name) => Framing::from_str(&name, true).map_err(|_| {
                    AppError::InvalidConfiguration(format!("unknown framing '{name}'"))
                })?,
                None => defaults.framing,
            },
        };

        let config = Self {
            listen: cli
                .listen
                .clone()
                .or_else(|| ini.get_string("server", "listen"))
                .unwrap_or(defaults.listen),
            port,
            chunk_size: cli
                .chunk_size
                .or_else(|| ini.get_size("server", "chunk_size"))
                .unwrap_or(defaults.chunk_size),
            read_timeout_ms: cli
                .read_timeout_ms
                .or_else(|| ini.get_u64("server", "read_timeout_ms"))
                .unwrap_or(defaults.read_timeout_ms),
            framing,

            root: cli
                .root
                .clone()
                .or_else(|| ini.get_string("storage", "root").map(PathBuf::from))
                .unwrap_or(defaults.root),
            upload_dir: cli
                .upload_dir
                .clone()
                .or_else(|| ini.get_string("storage", "upload_dir"))
                .unwrap_or(defaults.upload_dir),
            public_host: cli
                .public_host
                .clone()
                .or_else(|| ini.get_string("storage", "public_host"))
                .unwrap_or_else(|| format!("localhost:{port}")),
            confine_paths: cli
                .confine_paths
                .or_else(|| ini.get_bool("storage", "confine_paths"))
                .unwrap_or(defaults.confine_paths),

            verbose: cli
                .verbose
                .or_else(|| ini.get_bool("logging", "verbose"))
                .unwrap_or(defaults.verbose),
            detailed_logging: cli
                .detailed_logging
                .or_else(|| ini.get_bool("logging", "detailed"))
                .unwrap_or(defaults.detailed_logging),
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of preference
    fn find_config_file(cli: &Cli) -> Result<Option<PathBuf>, AppError> {
        if let Some(ref config_path) = cli.config_file {
            let path = PathBuf::from(config_path);
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(AppError::InvalidConfiguration(format!(
                "Config file specified but not found: {config_path}"
            )));
        }

        let mut candidates = vec![PathBuf::from("imgdrop.ini"), PathBuf::from("imgdrop.conf")];
        if let Some(home_dir) = std::env::var_os("HOME") {
            candidates.push(
                Path::new(&home_dir)
                    .join(".config")
                    .join("imgdrop")
                    .join("config.ini"),
            );
        }
        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/imgdrop/config.ini"));

        Ok(candidates.into_iter().find(|path| path.is_file()))
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::InvalidConfiguration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(AppError::InvalidConfiguration(
                "read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.upload_dir.trim_matches('/').is_empty() {
            return Err(AppError::InvalidConfiguration(
                "upload_dir must name a directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory uploads are written into.
    pub fn upload_root(&self) -> PathBuf {
        self.root.join(&self.upload_dir)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("Configuration Summary:");
        log::info!("  Server: {}", self.bind_address());
        log::info!("  Root: {}", self.root.display());
        log::info!("  Upload Directory: {}", self.upload_root().display());
        log::info!("  Public Host: {}", self.public_host);
        log::info!("  Chunk Size: {} bytes", self.chunk_size);
        log::info!("  Read Timeout: {} ms", self.read_timeout_ms);
        log::info!("  Framing: {:?}", self.framing);
        log::info!("  Confine Paths: {}", self.confine_paths);
    }
}
