//! Configuration loading for bot-pilot.

use log::info;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings, loaded from `pilot.toml`.
#[derive(Debug, Deserialize)]
pub struct PilotConfig {
    /// Engine command; a bare name is resolved via `PATH`.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Time budget handed to the engine per request, in milliseconds.
    #[serde(default = "default_movetime_ms")]
    pub movetime_ms: u64,
    /// Watcher poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Bound on the initialization handshake in milliseconds.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

fn default_engine() -> String {
    "stockfish".to_string()
}

fn default_movetime_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            movetime_ms: default_movetime_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

impl PilotConfig {
    /// Load `pilot.toml` from the current directory or a parent directory,
    /// falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file is found but cannot be read or
    /// parsed. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let paths = ["pilot.toml", "../pilot.toml", "../../pilot.toml"];

        for path in paths {
            if Path::new(path).exists() {
                let content = std::fs::read_to_string(path)?;
                let config = toml::from_str(&content)?;
                info!("loaded config from {}", path);
                return Ok(config);
            }
        }

        info!("no pilot.toml found, using defaults");
        Ok(Self::default())
    }
}
