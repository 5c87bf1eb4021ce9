//! Fjall-based persistence for download records.
//!
//! One partition (`downloads`) keyed by download id holds the full
//! [`DownloadRecord`] as JSON. Every operation is individually atomic;
//! the manager never needs multi-record transactions. All writes go
//! through the coordinator task; workers only read.

pub mod error;
pub mod record;

use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

pub use error::{Result, StoreError};
pub use record::{DownloadRecord, DownloadStatus};

fn encode_record_key(id: &str) -> Vec<u8> {
    format!("dl:{}", id).into_bytes()
}

/// Durable store for download records.
#[derive(Clone)]
pub struct DownloadStore {
    keyspace: Keyspace,
    downloads: PartitionHandle,
}

impl DownloadStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening download store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let downloads =
            keyspace.open_partition("downloads", PartitionCreateOptions::default())?;

        Ok(Self { keyspace, downloads })
    }

    /// Insert a freshly created record. Overwrites nothing in practice:
    /// ids are uuid v4 and never reused.
    pub fn create(&self, record: &DownloadRecord) -> Result<()> {
        self.put(record)?;
        debug!(id = %record.id, url = %record.url, "Created download record");
        Ok(())
    }

    /// Persist the current state of an existing record.
    pub fn update(&self, record: &DownloadRecord) -> Result<()> {
        self.put(record)
    }

    fn put(&self, record: &DownloadRecord) -> Result<()> {
        let key = encode_record_key(&record.id);
        let value = serde_json::to_vec(record)?;
        self.downloads.insert(key, value)?;
        Ok(())
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &str) -> Result<Option<DownloadRecord>> {
        let key = encode_record_key(id);
        match self.downloads.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// All records, most recently created first.
    pub fn list_all(&self) -> Result<Vec<DownloadRecord>> {
        let mut records = Vec::new();
        for item in self.downloads.iter() {
            let (_, value) = item?;
            let record: DownloadRecord = serde_json::from_slice(&value)?;
            records.push(record);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let key = encode_record_key(id);
        let existed = self.downloads.get(&key)?.is_some();
        if existed {
            self.downloads.remove(key)?;
            debug!(id, "Deleted download record");
        }
        Ok(existed)
    }

    /// Remove every record.
    pub fn delete_all(&self) -> Result<()> {
        let keys: Vec<_> = self
            .downloads
            .iter()
            .map(|item| item.map(|(k, _)| k))
            .collect::<std::result::Result<_, _>>()?;
        for key in keys {
            self.downloads.remove(key)?;
        }
        debug!("Deleted all download records");
        Ok(())
    }

    /// Flush pending writes to disk.
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}
