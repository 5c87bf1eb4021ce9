//! Coordinator message protocol.
//!
//! Every mutation of a download record travels through one of these
//! messages and is applied by the coordinator task, which serializes all
//! writes to a given record. Workers never touch the store directly.

use tokio::sync::oneshot;

use super::error::ManagerError;
use super::request::{DownloadRequest, Observer};
use crate::engine::ProgressEvent;
use crate::store::DownloadRecord;

pub(crate) enum Msg {
    // Upward-facing operations.
    Start {
        request: DownloadRequest,
        observer: Option<Observer>,
        reply: oneshot::Sender<Result<String, ManagerError>>,
    },
    Pause {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Cancel {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Resume {
        id: String,
        observer: Option<Observer>,
        reply: oneshot::Sender<bool>,
    },
    ResumeAll {
        reply: oneshot::Sender<usize>,
    },
    Delete {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    DeleteAll {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },

    // Worker-side job re-entry. Each carries the attempt number the job was
    // spawned with; the coordinator drops any message whose attempt no
    // longer matches the registered entry, so a superseded attempt that is
    // still unwinding cannot disturb its successor.
    /// Step into `Downloading`: re-reads the record, persists the
    /// transition, and returns the record, or `None` when the download
    /// was deleted or withdrawn while queued.
    JobBegin {
        id: String,
        attempt: u64,
        reply: oneshot::Sender<Option<DownloadRecord>>,
    },
    /// Metadata resolved; persist the title.
    JobTitle {
        id: String,
        attempt: u64,
        title: String,
    },
    /// One progress tick. Sent lossily: dropping a tick is acceptable.
    JobProgress {
        id: String,
        attempt: u64,
        event: ProgressEvent,
    },
    /// The job terminated; always the last message for an attempt.
    JobFinished {
        id: String,
        attempt: u64,
        outcome: JobOutcome,
    },
}

pub(crate) enum JobOutcome {
    /// Engine finished the fetch.
    Completed,
    /// Engine failed for a reason other than cancellation; the message is
    /// sanitized before it reaches the record.
    Failed(String),
    /// The abort token fired; pause/cancel already wrote the status, so the
    /// job terminates without altering it.
    Aborted,
    /// The record vanished before the job could begin.
    Skipped,
}
