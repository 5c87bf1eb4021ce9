use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Fjall keyspace holding the download records.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            store_path: default_store_path(),
        }
    }
}

/// Download lifecycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Worker-pool capacity: concurrent fetch jobs.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Fallback output directory; the user's Downloads folder when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_quality")]
    pub default_quality: String,
    /// Netscape cookie jar for authenticated providers.
    #[serde(default)]
    pub cookies_path: Option<PathBuf>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            output_dir: None,
            default_format: default_format(),
            default_quality: default_quality(),
            cookies_path: None,
        }
    }
}

impl DownloadsConfig {
    /// Configured output directory, or the platform Downloads folder.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Fetch engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// yt-dlp binary; resolved through PATH when not absolute.
    #[serde(default = "default_engine_binary")]
    pub binary: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: default_engine_binary(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/downloads")
}

fn default_workers() -> usize {
    crate::manager::DEFAULT_WORKERS
}

fn default_format() -> String {
    "mp4".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

fn default_engine_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}
