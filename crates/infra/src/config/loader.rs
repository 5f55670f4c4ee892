//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CONSOLE_API_BASE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CONSOLE_API_BASE_URL`: Upstream API base URL (required)
//! - `CONSOLE_HTTP_TIMEOUT_SECS`: Per-attempt timeout in seconds
//! - `CONSOLE_HTTP_MAX_RETRIES`: Retries after the first attempt
//! - `CONSOLE_HTTP_RETRY_BASE_DELAY_MS`: Linear retry delay base
//! - `CONSOLE_CACHE_TTL_SECS`: Response freshness window
//! - `CONSOLE_CACHE_STALE_RETENTION_SECS`: How long past TTL stale data is kept
//! - `CONSOLE_REFRESH_ENDPOINT`: Session endpoint issuing new API keys
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./console.toml` or `./console.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent directory
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use console_domain::{ClientConfig, ClientError, Result};

pub const ENV_BASE_URL: &str = "CONSOLE_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CONSOLE_HTTP_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "CONSOLE_HTTP_MAX_RETRIES";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "CONSOLE_HTTP_RETRY_BASE_DELAY_MS";
pub const ENV_CACHE_TTL_SECS: &str = "CONSOLE_CACHE_TTL_SECS";
pub const ENV_STALE_RETENTION_SECS: &str = "CONSOLE_CACHE_STALE_RETENTION_SECS";
pub const ENV_REFRESH_ENDPOINT: &str = "CONSOLE_REFRESH_ENDPOINT";

const CONFIG_FILE_NAMES: [&str; 4] = ["console.toml", "console.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is not
/// set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The resulting configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only the base URL is required; every other knob keeps its default when
/// unset.
///
/// # Errors
/// Returns `ClientError::Config` if the base URL is missing or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var(ENV_BASE_URL)?);

    if let Some(secs) = env_parse(ENV_TIMEOUT_SECS)? {
        config.transport.timeout_secs = secs;
    }
    if let Some(retries) = env_parse(ENV_MAX_RETRIES)? {
        config.transport.max_retries = retries;
    }
    if let Some(delay) = env_parse(ENV_RETRY_BASE_DELAY_MS)? {
        config.transport.base_delay_ms = delay;
    }
    if let Some(ttl) = env_parse(ENV_CACHE_TTL_SECS)? {
        config.cache.ttl_secs = ttl;
    }
    if let Some(retention) = env_parse(ENV_STALE_RETENTION_SECS)? {
        config.cache.stale_retention_secs = retention;
    }
    config.refresh_endpoint =
        std::env::var(ENV_REFRESH_ENDPOINT).ok().filter(|value| !value.trim().is_empty());

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClientError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClientError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ClientError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ClientError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and its parent, then the
/// executable's directory, for `console.{toml,json}` and
/// `config.{toml,json}`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ClientError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ClientError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `ClientError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClientError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
