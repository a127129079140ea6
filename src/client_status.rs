use crate::disk::{DiskOperations, RealDisk};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Client-wide context shared by every condition of a task run
///
/// `timestamp` is the moment the snapshot was taken and acts as "now" for
/// age-based conditions, which keeps evaluation reproducible.
#[derive(Clone)]
pub struct ClientStatus {
    pub timestamp: i64,
    /// Free space reported by the client itself, in bytes
    pub free_space: Option<u64>,
    pub download_speed: Option<u64>,
    pub upload_speed: Option<u64>,
    pub total_downloaded: Option<u64>,
    pub total_uploaded: Option<u64>,
    pub dht_nodes: Option<u64>,
    disk: Arc<dyn DiskOperations>,
}

impl ClientStatus {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            free_space: None,
            download_speed: None,
            upload_speed: None,
            total_downloaded: None,
            total_uploaded: None,
            dht_nodes: None,
            disk: Arc::new(RealDisk::new()),
        }
    }

    /// Status stamped with the current system time
    pub fn now() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);
        Self::new(timestamp)
    }

    pub fn with_free_space(mut self, free_space: u64) -> Self {
        self.free_space = Some(free_space);
        self
    }

    pub fn with_disk(mut self, disk: Arc<dyn DiskOperations>) -> Self {
        self.disk = disk;
        self
    }

    /// Free space on the local filesystem holding `path`
    pub fn local_free_space(&self, path: &Path) -> io::Result<u64> {
        self.disk.free_space(path)
    }
}

impl fmt::Debug for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientStatus")
            .field("timestamp", &self.timestamp)
            .field("free_space", &self.free_space)
            .field("download_speed", &self.download_speed)
            .field("upload_speed", &self.upload_speed)
            .field("total_downloaded", &self.total_downloaded)
            .field("total_uploaded", &self.total_uploaded)
            .field("dht_nodes", &self.dht_nodes)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: Option<u64>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "free space: {}, download speed: {} B/s, upload speed: {} B/s, downloaded: {}, uploaded: {}, DHT nodes: {}",
            show(self.free_space),
            show(self.download_speed),
            show(self.upload_speed),
            show(self.total_downloaded),
            show(self.total_uploaded),
            show(self.dht_nodes)
        )
    }
}
