use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata resolved for a URL without downloading anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    /// Duration in seconds, zero when unknown.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// One candidate format advertised by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub fps: f64,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    /// Audio bitrate.
    #[serde(default)]
    pub abr: f64,
    /// Total bitrate.
    #[serde(default)]
    pub tbr: f64,
    #[serde(default)]
    pub format_note: Option<String>,
}

/// One progress tick from the engine, at an engine-determined cadence.
#[derive(Debug, Clone, Default)]
pub struct ProgressEvent {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    /// Bytes per second.
    pub speed: Option<f64>,
    /// Estimated seconds remaining.
    pub eta: Option<i64>,
    pub filename: Option<String>,
}

/// Resolved options handed to the engine for one fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub output_dir: PathBuf,
    /// Provider-specific selector built by [`crate::engine::selector::format_selector`].
    pub format_selector: String,
    /// Present only when the file exists and passed the format check.
    pub cookies_file: Option<PathBuf>,
    pub user_agent: String,
    pub referer: String,
}

impl FetchOptions {
    /// Browser-identity defaults the original desktop app always sends.
    pub fn browser_like(output_dir: PathBuf, format_selector: String) -> Self {
        Self {
            output_dir,
            format_selector,
            cookies_file: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            referer: "https://www.youtube.com/".to_string(),
        }
    }
}
