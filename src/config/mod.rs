//! Configuration management for mediadock
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use mediadock::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MEDIADOCK__<section>__<key>`
//!
//! Examples:
//! - `MEDIADOCK__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `MEDIADOCK__DOWNLOADS__WORKERS=5`
//! - `MEDIADOCK__DOWNLOADS__COOKIES_PATH=/home/user/cookies.txt`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/mediadock.toml`.
//! This can be overridden using the `MEDIADOCK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{Config, DownloadsConfig, EngineConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

use crate::manager::ManagerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`MEDIADOCK__*`)
    /// 2. TOML file (default: `config/mediadock.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (zero workers, empty engine binary, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Lifecycle-manager settings derived from this configuration.
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            workers: self.downloads.workers,
            output_dir: self.downloads.resolved_output_dir(),
            cookies_path: self.downloads.cookies_path.clone(),
        }
    }
}
