//! yt-dlp subprocess engine.
//!
//! Runs the `yt-dlp` binary: `-J` for metadata probes and a streaming
//! download with `--newline --progress-template` so progress arrives as one
//! JSON object per line on stdout. Abort kills the child process; yt-dlp
//! leaves partial `.part` files behind, which a re-attempt overwrites.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{FetchOptions, FormatInfo, MediaMetadata, ProgressEvent};
use super::{EngineError, FetchEngine, ProgressSink, Result};

const PROGRESS_PREFIX: &str = "mdprogress:";

pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments the original desktop app always passes: browser identity
    /// plus bounded provider-side retries.
    fn identity_args(&self, options: &FetchOptions) -> Vec<String> {
        let mut args = vec![
            "--user-agent".to_string(),
            options.user_agent.clone(),
            "--referer".to_string(),
            options.referer.clone(),
            "--extractor-retries".to_string(),
            "3".to_string(),
            "--fragment-retries".to_string(),
            "3".to_string(),
        ];
        if let Some(cookies) = &options.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.display().to_string());
        }
        args
    }
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    async fn resolve_metadata(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<MediaMetadata> {
        let output = Command::new(&self.binary)
            .arg("-J")
            .arg("--no-warnings")
            .arg("--skip-download")
            .args(self.identity_args(options))
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Unavailable(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Metadata(stderr.trim().to_string()));
        }

        let info: RawInfo = serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::Metadata(format!("unparseable extractor output: {}", e)))?;

        let mut formats: Vec<FormatInfo> = info
            .formats
            .into_iter()
            .map(RawFormat::into_format_info)
            .collect();
        // Highest resolution first, matching what the picker UI expects.
        formats.sort_by(|a, b| b.height.cmp(&a.height));

        Ok(MediaMetadata {
            title: info.title.unwrap_or_else(|| "Unknown".to_string()),
            duration: info.duration.unwrap_or(0.0),
            formats,
        })
    }

    async fn download(
        &self,
        url: &str,
        options: &FetchOptions,
        sink: ProgressSink,
    ) -> Result<()> {
        sink.check_abort()?;

        let outtmpl = options.output_dir.join("%(title)s.%(ext)s");
        let mut child = Command::new(&self.binary)
            .arg("--newline")
            .arg("--no-warnings")
            .arg("--progress-template")
            .arg(format!("{}%(progress)j", PROGRESS_PREFIX))
            .arg("-f")
            .arg(&options.format_selector)
            .arg("-o")
            .arg(&outtmpl)
            .args(self.identity_args(options))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("failed to spawn yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("yt-dlp stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Unavailable("yt-dlp stderr not captured".to_string()))?;

        // Drain stderr concurrently so the child never blocks on a full pipe;
        // keep the tail for the failure message.
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() >= 20 {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail.join("\n")
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut aborted = false;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Error reading yt-dlp output");
                    break;
                }
            };

            let Some(payload) = line.strip_prefix(PROGRESS_PREFIX) else {
                continue;
            };
            let Ok(raw) = serde_json::from_str::<RawProgress>(payload) else {
                debug!(line = %payload, "Skipping unparseable progress line");
                continue;
            };
            if raw.status.as_deref() != Some("downloading") {
                continue;
            }

            if sink.deliver(raw.into_event()).is_err() {
                aborted = true;
                break;
            }
        }

        if aborted {
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "Failed to kill yt-dlp after abort");
            }
            let _ = child.wait().await;
            stderr_task.abort();
            return Err(EngineError::Aborted);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::Download(format!("failed to wait for yt-dlp: {}", e)))?;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else if stderr_tail.is_empty() {
            Err(EngineError::Download(format!(
                "yt-dlp exited with {}",
                status
            )))
        } else {
            Err(EngineError::Download(stderr_tail))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

/// yt-dlp emits nulls and floats where integers are expected; normalize here.
#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    resolution: Option<String>,
    height: Option<f64>,
    width: Option<f64>,
    filesize: Option<f64>,
    fps: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    abr: Option<f64>,
    tbr: Option<f64>,
    format_note: Option<String>,
}

impl RawFormat {
    fn into_format_info(self) -> FormatInfo {
        FormatInfo {
            format_id: self.format_id.unwrap_or_else(|| "unknown".to_string()),
            ext: self.ext.unwrap_or_else(|| "unknown".to_string()),
            resolution: self.resolution,
            height: self.height.unwrap_or(0.0) as u32,
            width: self.width.unwrap_or(0.0) as u32,
            filesize: self.filesize.unwrap_or(0.0) as u64,
            fps: self.fps.unwrap_or(0.0),
            vcodec: self.vcodec,
            acodec: self.acodec,
            abr: self.abr.unwrap_or(0.0),
            tbr: self.tbr.unwrap_or(0.0),
            format_note: self.format_note,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProgress {
    status: Option<String>,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
    filename: Option<String>,
}

impl RawProgress {
    fn into_event(self) -> ProgressEvent {
        ProgressEvent {
            downloaded_bytes: self.downloaded_bytes.unwrap_or(0.0) as u64,
            total_bytes: self
                .total_bytes
                .or(self.total_bytes_estimate)
                .map(|b| b as u64),
            speed: self.speed,
            eta: self.eta.map(|e| e as i64),
            filename: self.filename,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_parsing() {
        let payload = r#"{"status": "downloading", "downloaded_bytes": 1048576,
            "total_bytes": null, "total_bytes_estimate": 4194304.7,
            "speed": 524288.5, "eta": 6.2, "filename": "clip.mp4"}"#;
        let raw: RawProgress = serde_json::from_str(payload).unwrap();
        let event = raw.into_event();

        assert_eq!(event.downloaded_bytes, 1_048_576);
        assert_eq!(event.total_bytes, Some(4_194_304));
        assert_eq!(event.eta, Some(6));
        assert_eq!(event.filename.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn test_info_parsing_tolerates_missing_fields() {
        let payload = r#"{"title": "A Video", "formats": [
            {"format_id": "22", "ext": "mp4", "height": 720},
            {"format_id": "18", "ext": "mp4", "height": 360, "filesize": null}
        ]}"#;
        let info: RawInfo = serde_json::from_str(payload).unwrap();
        assert_eq!(info.title.as_deref(), Some("A Video"));
        assert_eq!(info.formats.len(), 2);

        let fmt = info.formats.into_iter().next().unwrap().into_format_info();
        assert_eq!(fmt.format_id, "22");
        assert_eq!(fmt.height, 720);
        assert_eq!(fmt.filesize, 0);
    }
}
