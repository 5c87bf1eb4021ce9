//! Fetch-engine boundary.
//!
//! The lifecycle manager never performs network retrieval itself; it drives
//! a [`FetchEngine`] collaborator through this trait. Engines deliver
//! progress through a [`ProgressSink`], which doubles as the cooperative
//! cancellation point: when the sink reports [`EngineError::Aborted`], the
//! engine must stop and unwind cleanly rather than treating it as a fault.

pub mod selector;
pub mod types;
pub mod ytdlp;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;

pub use types::{FetchOptions, FormatInfo, MediaMetadata, ProgressEvent};
pub use ytdlp::YtDlpEngine;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The sink refused a tick because the download was paused or cancelled.
    /// Never surfaced to the record as an error state.
    #[error("download aborted")]
    Aborted,

    #[error("metadata extraction failed: {0}")]
    Metadata(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Shared abort flag for one download attempt. Registered with the active
/// entry on the coordinator side; checked by the sink before every tick.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the running job to stop at its next progress tick.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress conduit handed to the engine for one download.
///
/// Delivery is best-effort: a tick may be dropped if the coordinator is
/// busy, which is acceptable (most-recent-wins). The abort check is not
/// best-effort: every call observes the token first.
pub struct ProgressSink {
    token: AbortToken,
    deliver: Box<dyn Fn(ProgressEvent) + Send + Sync>,
}

impl ProgressSink {
    pub fn new(token: AbortToken, deliver: Box<dyn Fn(ProgressEvent) + Send + Sync>) -> Self {
        Self { token, deliver }
    }

    /// Forward one tick unless the attempt has been aborted.
    pub fn deliver(&self, event: ProgressEvent) -> Result<()> {
        if self.token.is_aborted() {
            return Err(EngineError::Aborted);
        }
        (self.deliver)(event);
        Ok(())
    }

    /// Check the token without delivering anything. Engines call this at
    /// entry and at any long stretch without progress output.
    pub fn check_abort(&self) -> Result<()> {
        if self.token.is_aborted() {
            return Err(EngineError::Aborted);
        }
        Ok(())
    }
}

/// External collaborator that resolves metadata and fetches content.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Resolve title, duration and candidate formats without downloading.
    async fn resolve_metadata(&self, url: &str, options: &FetchOptions)
    -> Result<MediaMetadata>;

    /// Fetch the content, emitting progress through the sink. Must return
    /// [`EngineError::Aborted`] (and stop transferring) once the sink
    /// reports it.
    async fn download(&self, url: &str, options: &FetchOptions, sink: ProgressSink)
    -> Result<()>;
}
