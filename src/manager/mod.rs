//! Download lifecycle manager.
//!
//! The manager tracks each download's state machine, dispatches fetch jobs
//! to a bounded worker pool, bridges progress from workers back to a single
//! coordinating task, and reconciles persisted state on startup.
//!
//! Architecture:
//! 1. [`DownloadManager`] is a cheap clonable handle over an mpsc channel.
//! 2. A coordinator task owns the store writes, the active-download
//!    registry and the observer registry; it consumes every message and is
//!    the sole writer of state transitions.
//! 3. Jobs are spawned tokio tasks that claim a semaphore permit (pool
//!    capacity, default 3) and drive the fetch engine, reporting back over
//!    the same channel.
//!
//! Cancellation is cooperative: pause/cancel persist the target status,
//! withdraw the active entry (flipping its abort token) and interrupt the
//! join handle. A worker that is already mid-tick sees the token at its
//! next progress delivery and unwinds without touching the status.

pub(crate) mod active;
pub mod error;
pub(crate) mod job;
pub(crate) mod messages;
pub(crate) mod reconcile;
pub mod request;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{AbortToken, EngineError, FetchEngine, FetchOptions, MediaMetadata};
use crate::observability::Metrics;
use crate::store::{DownloadRecord, DownloadStatus, DownloadStore};

use active::{ActiveRegistry, Phase};
use job::{JobContext, JobDefaults};
use messages::{JobOutcome, Msg};

pub use error::{ManagerError, Result, sanitize_engine_message};
pub use request::{DownloadRequest, Observer};

/// Capacity of the coordinator inbox. Progress ticks are sent lossily, so a
/// full queue drops telemetry rather than stalling workers.
const COORDINATOR_QUEUE: usize = 256;

pub const DEFAULT_WORKERS: usize = 3;

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Worker-pool capacity: concurrent fetch jobs.
    pub workers: usize,
    /// Fallback output directory when a request carries none.
    pub output_dir: PathBuf,
    /// Cookie jar handed to the engine when it passes the format check.
    pub cookies_path: Option<PathBuf>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            cookies_path: None,
        }
    }
}

/// Handle to the lifecycle coordinator.
///
/// All mutating operations marshal onto the coordinator task; reads go
/// straight to the store.
#[derive(Clone)]
pub struct DownloadManager {
    tx: mpsc::Sender<Msg>,
    store: DownloadStore,
    engine: Arc<dyn FetchEngine>,
    settings: ManagerSettings,
}

impl DownloadManager {
    pub fn new(
        store: DownloadStore,
        engine: Arc<dyn FetchEngine>,
        metrics: Arc<Metrics>,
        settings: ManagerSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COORDINATOR_QUEUE);

        let coordinator = Coordinator {
            store: store.clone(),
            engine: Arc::clone(&engine),
            permits: Arc::new(Semaphore::new(settings.workers)),
            active: ActiveRegistry::new(),
            observers: std::collections::HashMap::new(),
            job_tx: tx.clone(),
            defaults: JobDefaults {
                output_dir: settings.output_dir.clone(),
                cookies_path: settings.cookies_path.clone(),
            },
            metrics,
            attempts: 0,
        };
        tokio::spawn(coordinator.run(rx));

        Self {
            tx,
            store,
            engine,
            settings,
        }
    }

    /// Queue a new download. Returns its id immediately; the fetch runs on
    /// a worker slot. The observer, if any, receives record snapshots after
    /// each persisted progress update.
    pub async fn start(
        &self,
        request: DownloadRequest,
        observer: Option<Observer>,
    ) -> Result<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Msg::Start {
            request,
            observer,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| ManagerError::Unavailable)?
    }

    /// Pause a download. Returns false when no record exists.
    pub async fn pause(&self, id: &str) -> Result<bool> {
        self.roundtrip_bool(|reply| Msg::Pause {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Cancel a download. Idempotent-ish: cancelling an already-settled
    /// record is a no-op success as long as the record exists.
    pub async fn cancel(&self, id: &str) -> Result<bool> {
        self.roundtrip_bool(|reply| Msg::Cancel {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Re-queue a paused download under the same id. Returns false when the
    /// record is missing or not paused.
    pub async fn resume(&self, id: &str, observer: Option<Observer>) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Msg::Resume {
            id: id.to_string(),
            observer,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| ManagerError::Unavailable)
    }

    /// Startup reconciliation: re-queue and resubmit downloads interrupted
    /// by an unclean shutdown. Returns the number resubmitted. Runs to
    /// completion inside the coordinator, so any `start` sent afterwards is
    /// ordered behind it.
    pub async fn resume_all(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Msg::ResumeAll { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ManagerError::Unavailable)
    }

    /// Remove a record, cancelling its job first when active.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.roundtrip_bool(|reply| Msg::Delete {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Remove every record, cancelling all active jobs.
    pub async fn delete_all(&self) -> Result<bool> {
        self.roundtrip_bool(|reply| Msg::DeleteAll { reply }).await
    }

    /// Cancel all active downloads for process shutdown.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Msg::Shutdown { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| ManagerError::Unavailable)
    }

    /// Read one record.
    pub fn get(&self, id: &str) -> Result<Option<DownloadRecord>> {
        Ok(self.store.get(id)?)
    }

    /// Read all records, most recently created first.
    pub fn list(&self) -> Result<Vec<DownloadRecord>> {
        Ok(self.store.list_all()?)
    }

    /// Read-only metadata probe: reuses the engine's extraction step
    /// without submitting a job or claiming a worker slot.
    pub async fn list_formats(&self, url: &str) -> Result<MediaMetadata> {
        let mut options =
            FetchOptions::browser_like(self.settings.output_dir.clone(), "best".to_string());
        if let Some(path) = &self.settings.cookies_path {
            if crate::cookies::validate_cookie_file(path) {
                options.cookies_file = Some(path.clone());
            }
        }

        self.engine
            .resolve_metadata(url, &options)
            .await
            .map_err(|e| match e {
                EngineError::Aborted => ManagerError::Engine(e),
                e => ManagerError::Engine(EngineError::Metadata(sanitize_engine_message(
                    url,
                    &e.to_string(),
                ))),
            })
    }

    async fn send(&self, msg: Msg) -> Result<()> {
        self.tx.send(msg).await.map_err(|_| ManagerError::Unavailable)
    }

    async fn roundtrip_bool(
        &self,
        make: impl FnOnce(oneshot::Sender<bool>) -> Msg,
    ) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| ManagerError::Unavailable)
    }
}

/// Single-writer coordinating task. Owns every piece of mutable lifecycle
/// state; messages are processed one at a time, total-ordering all writes
/// to any given record.
struct Coordinator {
    store: DownloadStore,
    engine: Arc<dyn FetchEngine>,
    permits: Arc<Semaphore>,
    active: ActiveRegistry,
    observers: std::collections::HashMap<String, Observer>,
    job_tx: mpsc::Sender<Msg>,
    defaults: JobDefaults,
    metrics: Arc<Metrics>,
    /// Monotonically increasing attempt counter; stamped onto each spawned
    /// job and its active entry.
    attempts: u64,
}

impl Coordinator {
    async fn run(mut self, mut rx: mpsc::Receiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::Start {
                    request,
                    observer,
                    reply,
                } => {
                    let _ = reply.send(self.handle_start(request, observer));
                }
                Msg::Pause { id, reply } => {
                    let _ = reply.send(self.halt(&id, DownloadStatus::Paused));
                }
                Msg::Cancel { id, reply } => {
                    let _ = reply.send(self.halt(&id, DownloadStatus::Cancelled));
                }
                Msg::Resume {
                    id,
                    observer,
                    reply,
                } => {
                    let _ = reply.send(self.handle_resume(&id, observer));
                }
                Msg::ResumeAll { reply } => {
                    let _ = reply.send(self.handle_resume_all());
                }
                Msg::Delete { id, reply } => {
                    let _ = reply.send(self.handle_delete(&id));
                }
                Msg::DeleteAll { reply } => {
                    let _ = reply.send(self.handle_delete_all());
                }
                Msg::Shutdown { reply } => {
                    self.handle_shutdown();
                    let _ = reply.send(());
                }
                Msg::JobBegin { id, attempt, reply } => {
                    let _ = reply.send(self.handle_job_begin(&id, attempt));
                }
                Msg::JobTitle { id, attempt, title } => {
                    self.handle_job_title(&id, attempt, title)
                }
                Msg::JobProgress { id, attempt, event } => {
                    self.handle_job_progress(&id, attempt, event)
                }
                Msg::JobFinished {
                    id,
                    attempt,
                    outcome,
                } => self.handle_job_finished(&id, attempt, outcome),
            }
        }
        debug!("Coordinator stopped");
    }

    fn handle_start(
        &mut self,
        request: DownloadRequest,
        observer: Option<Observer>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = DownloadRecord::new(id.clone(), request.url.clone());
        self.store.create(&record)?;

        if let Some(observer) = observer {
            self.observers.insert(id.clone(), observer);
        }
        self.spawn_job(id.clone(), request);
        self.metrics.download_started();
        info!(id = %id, url = %record.url, "Download queued");
        Ok(id)
    }

    /// Shared shape of pause and cancel: persist the target status so the
    /// worker's next check observes it, withdraw the active entry, and
    /// interrupt the job. Records already settled are left untouched; the
    /// operation still reports success because the record exists.
    fn halt(&mut self, id: &str, target: DownloadStatus) -> bool {
        let record = match self.store.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!(id, error = %e, "Store read failed during pause/cancel");
                return false;
            }
        };

        if record.status != target && !record.status.is_terminal() {
            let mut record = record;
            record.status = target;
            if let Err(e) = self.store.update(&record) {
                warn!(id, error = %e, "Store write failed during pause/cancel");
                return false;
            }
            match target {
                DownloadStatus::Cancelled => self.metrics.download_cancelled(),
                DownloadStatus::Paused => self.metrics.download_paused(),
                _ => {}
            }
            info!(id, status = %target, "Download halted");
        }

        if let Some(entry) = self.active.remove(id) {
            entry.handle.abort();
        }
        self.observers.remove(id);
        true
    }

    fn handle_resume(&mut self, id: &str, observer: Option<Observer>) -> bool {
        let mut record = match self.store.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(id, "Resume requested for unknown download");
                return false;
            }
            Err(e) => {
                warn!(id, error = %e, "Store read failed during resume");
                return false;
            }
        };

        if record.status != DownloadStatus::Paused || self.active.contains(id) {
            debug!(id, status = %record.status, "Resume refused: not paused");
            return false;
        }

        record.status = DownloadStatus::Queued;
        if let Err(e) = self.store.update(&record) {
            warn!(id, error = %e, "Store write failed during resume");
            return false;
        }

        if let Some(observer) = observer {
            self.observers.insert(id.to_string(), observer);
        }
        self.spawn_job(id.to_string(), DownloadRequest::defaults_for(&record));
        info!(id, "Paused download re-queued");
        true
    }

    fn handle_resume_all(&mut self) -> usize {
        let records = match self.store.list_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Store listing failed during reconciliation");
                return 0;
            }
        };

        let partitioned = reconcile::partition(records);
        info!(
            interrupted = partitioned.interrupted.len(),
            pending = partitioned.pending,
            untouched = partitioned.untouched,
            "Startup reconciliation"
        );

        let mut resubmitted = 0;
        for mut record in partitioned.interrupted {
            if self.active.contains(&record.id) {
                continue;
            }
            // Re-queue, keeping the progress the prior attempt reached; the
            // new attempt overwrites it from zero once it starts.
            record.status = DownloadStatus::Queued;
            if let Err(e) = self.store.update(&record) {
                warn!(id = %record.id, error = %e, "Failed to re-queue interrupted download");
                continue;
            }
            let request = DownloadRequest::defaults_for(&record);
            self.spawn_job(record.id.clone(), request);
            resubmitted += 1;
        }
        resubmitted
    }

    fn handle_delete(&mut self, id: &str) -> bool {
        if let Some(entry) = self.active.remove(id) {
            entry.handle.abort();
        }
        self.observers.remove(id);
        match self.store.delete(id) {
            Ok(existed) => existed,
            Err(e) => {
                warn!(id, error = %e, "Store delete failed");
                false
            }
        }
    }

    fn handle_delete_all(&mut self) -> bool {
        for id in self.active.ids() {
            if let Some(entry) = self.active.remove(&id) {
                entry.handle.abort();
            }
        }
        self.observers.clear();
        match self.store.delete_all() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Store delete-all failed");
                false
            }
        }
    }

    fn handle_shutdown(&mut self) {
        info!(active = self.active.len(), "Cancelling all active downloads");
        for id in self.active.ids() {
            self.halt(&id, DownloadStatus::Cancelled);
        }
    }

    /// Worker claimed its slot: move the record to `downloading`. Refused
    /// (None) when the download was withdrawn, deleted while queued, or
    /// superseded by a newer attempt.
    fn handle_job_begin(&mut self, id: &str, attempt: u64) -> Option<DownloadRecord> {
        if !self.active.is_current(id, attempt) {
            return None;
        }
        match self.store.get(id) {
            Ok(Some(mut record)) => {
                record.status = DownloadStatus::Downloading;
                if let Err(e) = self.store.update(&record) {
                    warn!(id, error = %e, "Store write failed at download start");
                    return None;
                }
                self.active.set_phase(id, Phase::Downloading);
                debug!(id, "Download started");
                Some(record)
            }
            Ok(None) => {
                // Deleted while queued.
                self.active.remove(id);
                None
            }
            Err(e) => {
                warn!(id, error = %e, "Store read failed at download start");
                None
            }
        }
    }

    fn handle_job_title(&mut self, id: &str, attempt: u64, title: String) {
        if !self.active.is_current(id, attempt) {
            return;
        }
        if let Ok(Some(mut record)) = self.store.get(id) {
            record.title = Some(title);
            if let Err(e) = self.store.update(&record) {
                warn!(id, error = %e, "Store write failed for title update");
            }
        }
    }

    fn handle_job_progress(&mut self, id: &str, attempt: u64, event: crate::engine::ProgressEvent) {
        if !self.active.is_current(id, attempt) {
            return;
        }
        let mut record = match self.store.get(id) {
            Ok(Some(record)) => record,
            _ => return,
        };
        if record.status != DownloadStatus::Downloading {
            // Paused or cancelled concurrently: make sure the worker sees it
            // even if the status write raced past its last check.
            self.active.abort(id);
            return;
        }

        record.downloaded_bytes = event.downloaded_bytes;
        record.total_bytes = event.total_bytes;
        record.speed = event.speed;
        record.eta = event.eta;
        if let Some(filename) = event.filename {
            record.filename = Some(filename);
        }
        record.progress = match record.total_bytes {
            Some(total) if total > 0 => {
                (record.downloaded_bytes as f64 / total as f64) * 100.0
            }
            _ => 0.0,
        };

        if let Err(e) = self.store.update(&record) {
            warn!(id, error = %e, "Store write failed for progress update");
            return;
        }
        self.notify(&record);
    }

    fn handle_job_finished(&mut self, id: &str, attempt: u64, outcome: JobOutcome) {
        // A finish report from a superseded attempt must not touch the
        // registry: a pause that could not interrupt the old job may have
        // been followed by a resume, and the entry now belongs to the new
        // attempt. Pause/cancel already removed the entry for the old one.
        if !self.active.is_current(id, attempt) {
            debug!(id, attempt, "Ignoring finish report from superseded attempt");
            return;
        }

        match outcome {
            JobOutcome::Completed => {
                if let Ok(Some(mut record)) = self.store.get(id) {
                    record.status = DownloadStatus::Completed;
                    record.progress = 100.0;
                    record.completed_at = Some(Utc::now());
                    if let Err(e) = self.store.update(&record) {
                        warn!(id, error = %e, "Store write failed at completion");
                    } else {
                        self.notify(&record);
                        self.metrics.download_completed();
                        info!(id, title = record.title.as_deref().unwrap_or(""), "Download completed");
                    }
                }
            }
            JobOutcome::Failed(message) => {
                if let Ok(Some(mut record)) = self.store.get(id) {
                    let sanitized = sanitize_engine_message(&record.url, &message);
                    record.status = DownloadStatus::Error;
                    record.error_message = Some(sanitized);
                    if let Err(e) = self.store.update(&record) {
                        warn!(id, error = %e, "Store write failed at error");
                    } else {
                        self.notify(&record);
                        self.metrics.download_failed();
                        warn!(id, error = %message, "Download failed");
                    }
                }
            }
            JobOutcome::Aborted => {
                debug!(id, "Job unwound after pause/cancel");
            }
            JobOutcome::Skipped => {
                debug!(id, "Job skipped: record deleted before start");
            }
        }

        self.active.remove(id);
        self.observers.remove(id);
    }

    fn spawn_job(&mut self, id: String, request: DownloadRequest) {
        self.attempts += 1;
        let attempt = self.attempts;
        let token = AbortToken::new();
        let ctx = JobContext {
            id: id.clone(),
            attempt,
            request,
            engine: Arc::clone(&self.engine),
            permits: Arc::clone(&self.permits),
            tx: self.job_tx.clone(),
            token: token.clone(),
            defaults: self.defaults.clone(),
        };
        let handle = tokio::spawn(job::run(ctx));
        self.active.insert(id, attempt, token, handle);
    }

    fn notify(&self, record: &DownloadRecord) {
        if let Some(observer) = self.observers.get(&record.id) {
            if observer.try_send(record.clone()).is_err() {
                debug!(id = %record.id, "Observer not keeping up; snapshot dropped");
            }
        }
    }
}
