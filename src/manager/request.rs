use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::store::DownloadRecord;

fn default_format() -> String {
    "mp4".to_string()
}

fn default_quality() -> String {
    "best".to_string()
}

/// Caller-supplied parameters for one download attempt.
///
/// Request parameters are not persisted alongside the record, so a resumed
/// attempt is rebuilt with [`DownloadRequest::defaults_for`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: default_format(),
            quality: default_quality(),
            output_path: None,
        }
    }

    /// Synthesized request for resuming an existing record. The original
    /// format/quality/output choices are gone; defaults stand in.
    pub fn defaults_for(record: &DownloadRecord) -> Self {
        Self::new(record.url.clone())
    }
}

/// Observer channel for one download: receives the latest record snapshot
/// after each persisted progress update. Delivery is best-effort; a closed
/// or full channel never affects persisted state.
pub type Observer = tokio::sync::mpsc::Sender<DownloadRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let json = r#"{"url": "https://example.com/v"}"#;
        let request: DownloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.format, "mp4");
        assert_eq!(request.quality, "best");
        assert!(request.output_path.is_none());
    }

    #[test]
    fn test_defaults_for_record() {
        let record = DownloadRecord::new("id".to_string(), "https://example.com/v".to_string());
        let request = DownloadRequest::defaults_for(&record);
        assert_eq!(request.url, record.url);
        assert_eq!(request.quality, "best");
    }
}
