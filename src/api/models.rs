//! API models for the download endpoints.
//!
//! The HTTP surface is thin request/response glue over the lifecycle
//! manager: it maps the manager's explicit success/failure values onto
//! status codes and augments record snapshots with display-friendly
//! telemetry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::humanize::{format_eta, format_speed};
use crate::store::{DownloadRecord, DownloadStatus};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadAcceptedResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ActionResponse {
    pub success: bool,
}

/// Record snapshot as served to clients, with humanized telemetry.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadView {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub status: DownloadStatus,
    pub progress: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>,
    pub speed_human: Option<String>,
    pub eta: Option<i64>,
    pub eta_human: Option<String>,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<DownloadRecord> for DownloadView {
    fn from(record: DownloadRecord) -> Self {
        Self {
            speed_human: record.speed.map(format_speed),
            eta_human: record.eta.map(format_eta),
            id: record.id,
            url: record.url,
            title: record.title,
            filename: record.filename,
            status: record.status,
            progress: record.progress,
            downloaded_bytes: record.downloaded_bytes,
            total_bytes: record.total_bytes,
            speed: record.speed,
            eta: record.eta,
            error_message: record.error_message,
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatsQuery {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}
