use crate::accumulator::Framing;
use clap::Parser;
use std::path::PathBuf;

// Command-line interface. Every flag is optional so an INI file can fill the gaps.
#[derive(Parser, Clone, Debug, Default)]
#[command(
    version,
    about = "A tiny image drop server: POST raw image bytes in, GET them back out.",
    long_about = "Accepts one connection at a time. A POST stores the bytes after the header block under the upload directory, named by the Content-Disposition filename (or unnamed.jpg). A GET returns the file at the requested path as image/jpeg, or 404.\n Settings can also come from imgdrop.ini, ~/.config/imgdrop/config.ini or /etc/imgdrop/config.ini; flags win."
)]
pub struct Cli {
    /// Host address to listen on (e.g. "127.0.0.1" for local only, "0.0.0.0" for everyone)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory GET paths are resolved against and the upload directory lives in
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Upload directory name, relative to the root
    #[arg(short, long)]
    pub upload_dir: Option<String>,

    /// Host (and port) used when building the URL returned after an upload
    #[arg(long)]
    pub public_host: Option<String>,

    /// Receive buffer size in bytes; a read shorter than this ends a request under short-read framing
    #[arg(short, long, value_parser = validate_chunk_size)]
    pub chunk_size: Option<usize>,

    /// How long a read may block before the bytes received so far are taken as the whole request
    #[arg(short = 't', long, value_parser = validate_timeout)]
    pub read_timeout_ms: Option<u64>,

    /// How the end of a request is detected
    #[arg(short, long, value_enum)]
    pub framing: Option<Framing>,

    /// Keep upload names and GET paths inside the upload directory
    #[arg(long)]
    pub confine_paths: Option<bool>,

    /// Enable verbose logging for debugging (log level: debug)
    #[arg(short, long)]
    pub verbose: Option<bool>,

    /// Enable more detailed logging (log level: info if verbose=false)
    #[arg(long)]
    pub detailed_logging: Option<bool>,

    /// Configuration file path (INI format)
    #[arg(long, value_parser = validate_config_file)]
    pub config_file: Option<String>,
}

/// Chunk size must be between 1 byte and 16 MB
fn validate_chunk_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| "Chunk size must be a positive number".to_string())?;

    if size == 0 {
        return Err("Chunk size must be greater than 0".to_string());
    }

    if size > 16 * 1024 * 1024 {
        return Err("Chunk size must not exceed 16 MB".to_string());
    }

    Ok(size)
}

fn validate_timeout(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("Read timeout must be greater than 0 ms".to_string()),
        Ok(ms) => Ok(ms),
        Err(_) => Err("Read timeout must be a number of milliseconds".to_string()),
    }
}

/// Validate config file path exists and is readable
fn validate_config_file(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("Config file path cannot be empty".to_string());
    }

    let path = PathBuf::from(s);

    if !path.is_file() {
        return Err(format!("Config path is not a file: {s}"));
    }

    match std::fs::File::open(&path) {
        Ok(_) => Ok(s.to_string()),
        Err(e) => Err(format!("Cannot read config file {s}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_chunk_size() {
        assert_eq!(validate_chunk_size("1").unwrap(), 1);
        assert_eq!(validate_chunk_size("8192").unwrap(), 8192);

        assert!(validate_chunk_size("0").is_err());
        assert!(validate_chunk_size("-1").is_err());
        assert!(validate_chunk_size("abc").is_err());
        assert!(validate_chunk_size("999999999").is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert_eq!(validate_timeout("3500").unwrap(), 3500);
        assert!(validate_timeout("0").is_err());
        assert!(validate_timeout("soon").is_err());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "imgdrop",
            "--port",
            "9000",
            "--upload-dir",
            "pics",
            "--framing",
            "content-length",
            "--confine-paths",
            "true",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.upload_dir.as_deref(), Some("pics"));
        assert_eq!(cli.framing, Some(Framing::ContentLength));
        assert_eq!(cli.confine_paths, Some(true));
        assert_eq!(cli.listen, None);
    }

    #[test]
    fn test_missing_config_file_rejected() {
        let result = Cli::try_parse_from(["imgdrop", "--config-file", "/nonexistent/imgdrop.ini"]);
        assert!(result.is_err());
    }
}
