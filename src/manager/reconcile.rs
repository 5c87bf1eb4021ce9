//! Startup reconciliation.
//!
//! After an unclean shutdown the store can hold records claiming to be
//! `downloading` with no worker behind them. The reconciliation pass
//! partitions all records and decides which get re-queued and resubmitted.
//! No byte-range resume: a resubmitted attempt starts over with synthesized
//! default request parameters.

use crate::store::{DownloadRecord, DownloadStatus};

/// Outcome of partitioning the store contents at startup.
#[derive(Debug, Default)]
pub(crate) struct Reconciliation {
    /// Interrupted mid-transfer: `downloading`, or `queued` with progress.
    /// These are re-queued and resubmitted.
    pub interrupted: Vec<DownloadRecord>,
    /// `queued` with zero progress: never started, left as-is.
    pub pending: usize,
    /// Paused/terminal records, left untouched.
    pub untouched: usize,
}

pub(crate) fn partition(records: Vec<DownloadRecord>) -> Reconciliation {
    let mut result = Reconciliation::default();
    for record in records {
        if record.is_interrupted() {
            result.interrupted.push(record);
        } else if record.status == DownloadStatus::Queued {
            result.pending += 1;
        } else {
            result.untouched += 1;
        }
    }
    result
}
