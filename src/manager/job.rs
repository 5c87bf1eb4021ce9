//! Worker-side job execution.
//!
//! One job runs per download attempt, inside a spawned task that first
//! claims a worker-pool permit. The job never writes the store: lifecycle
//! transitions are awaited sends to the coordinator, progress ticks are
//! lossy `try_send`s. The abort token tied to the active entry is the only
//! cancellation mechanism; the engine observes it through the sink.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::{debug, warn};

use super::messages::{JobOutcome, Msg};
use super::request::DownloadRequest;
use crate::cookies::validate_cookie_file;
use crate::engine::selector::format_selector;
use crate::engine::{AbortToken, EngineError, FetchEngine, FetchOptions, ProgressSink};

/// Per-manager defaults a job falls back on when the request leaves them out.
#[derive(Debug, Clone)]
pub(crate) struct JobDefaults {
    pub output_dir: PathBuf,
    pub cookies_path: Option<PathBuf>,
}

pub(crate) struct JobContext {
    pub id: String,
    /// Attempt number assigned at spawn; stamped on every message so the
    /// coordinator can tell this attempt's reports from a successor's.
    pub attempt: u64,
    pub request: DownloadRequest,
    pub engine: Arc<dyn FetchEngine>,
    pub permits: Arc<Semaphore>,
    pub tx: mpsc::Sender<Msg>,
    pub token: AbortToken,
    pub defaults: JobDefaults,
}

/// Entry point spawned per download. Holds a pool permit for the duration
/// of the attempt and always reports a final outcome.
pub(crate) async fn run(ctx: JobContext) {
    let permit = match Arc::clone(&ctx.permits).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return, // pool closed during shutdown
    };

    let outcome = execute(&ctx).await;
    drop(permit);

    if ctx
        .tx
        .send(Msg::JobFinished {
            id: ctx.id.clone(),
            attempt: ctx.attempt,
            outcome,
        })
        .await
        .is_err()
    {
        debug!(id = %ctx.id, "Coordinator gone before job completion report");
    }
}

async fn execute(ctx: &JobContext) -> JobOutcome {
    // Withdrawn while waiting for a slot.
    if ctx.token.is_aborted() {
        return JobOutcome::Aborted;
    }

    // Transition to downloading via the coordinator; it re-reads the record
    // and refuses when the download was deleted concurrently.
    let (reply_tx, reply_rx) = oneshot::channel();
    let begin = Msg::JobBegin {
        id: ctx.id.clone(),
        attempt: ctx.attempt,
        reply: reply_tx,
    };
    if ctx.tx.send(begin).await.is_err() {
        return JobOutcome::Aborted;
    }
    let record = match reply_rx.await {
        Ok(Some(record)) => record,
        Ok(None) => return JobOutcome::Skipped,
        Err(_) => return JobOutcome::Aborted,
    };

    let options = resolve_options(ctx);
    debug!(
        id = %ctx.id,
        selector = %options.format_selector,
        output_dir = %options.output_dir.display(),
        "Resolved fetch options"
    );

    // Metadata first, so the record carries a title while downloading.
    match ctx.engine.resolve_metadata(&record.url, &options).await {
        Ok(metadata) => {
            let title = Msg::JobTitle {
                id: ctx.id.clone(),
                attempt: ctx.attempt,
                title: metadata.title,
            };
            if ctx.tx.send(title).await.is_err() {
                return JobOutcome::Aborted;
            }
        }
        Err(EngineError::Aborted) => return JobOutcome::Aborted,
        Err(e) => return JobOutcome::Failed(e.to_string()),
    }

    if ctx.token.is_aborted() {
        return JobOutcome::Aborted;
    }

    let sink = progress_sink(ctx);
    match ctx.engine.download(&record.url, &options, sink).await {
        Ok(()) => JobOutcome::Completed,
        Err(EngineError::Aborted) => JobOutcome::Aborted,
        Err(e) => JobOutcome::Failed(e.to_string()),
    }
}

fn progress_sink(ctx: &JobContext) -> ProgressSink {
    let tx = ctx.tx.clone();
    let id = ctx.id.clone();
    let attempt = ctx.attempt;
    ProgressSink::new(
        ctx.token.clone(),
        Box::new(move |event| {
            // Lossy on purpose: a full coordinator queue drops the tick
            // rather than blocking the engine.
            let _ = tx.try_send(Msg::JobProgress {
                id: id.clone(),
                attempt,
                event,
            });
        }),
    )
}

/// Resolve engine options per the fixed precedence: requested output path or
/// default dir, selector from quality+format, cookies only when the file
/// passes the format check.
fn resolve_options(ctx: &JobContext) -> FetchOptions {
    let output_dir = ctx
        .request
        .output_path
        .clone()
        .unwrap_or_else(|| ctx.defaults.output_dir.clone());

    let format = (!ctx.request.format.is_empty()).then_some(ctx.request.format.as_str());
    let selector = format_selector(&ctx.request.quality, format);

    let mut options = FetchOptions::browser_like(output_dir, selector);
    if let Some(path) = &ctx.defaults.cookies_path {
        if validate_cookie_file(path) {
            options.cookies_file = Some(path.clone());
        } else {
            warn!(path = %path.display(), "Ignoring invalid cookies file");
        }
    }
    options
}
