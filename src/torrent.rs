use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Working set of torrents. Ordered by hash so every pass over it is deterministic.
pub type TorrentSet = BTreeSet<Arc<Torrent>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TorrentStatus {
    Downloading,
    Uploading,
    Checking,
    Queued,
    Paused,
    Stopped,
    Error,
    #[default]
    Unknown,
}

impl TorrentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "Downloading",
            Self::Uploading => "Uploading",
            Self::Checking => "Checking",
            Self::Queued => "Queued",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TorrentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TorrentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "downloading" => Ok(Self::Downloading),
            "uploading" => Ok(Self::Uploading),
            "checking" => Ok(Self::Checking),
            "queued" => Ok(Self::Queued),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            "error" => Ok(Self::Error),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown torrent status: {other}")),
        }
    }
}

/// Snapshot of a single torrent as reported by the client.
///
/// Optional fields are the ones some clients do not expose; conditions that
/// need them report an unsupported property instead of guessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub tracker: Vec<String>,
    #[serde(default)]
    pub status: TorrentStatus,
    /// Share ratio; a negative value means infinite
    pub ratio: f64,
    pub size: u64,
    pub uploaded: u64,
    pub downloaded: Option<u64>,
    /// Unix timestamp (seconds) when the torrent was added
    pub create_time: i64,
    /// Unix timestamp (seconds) of the last transfer activity
    pub last_activity: i64,
    pub seeding_time: u64,
    pub downloading_time: u64,
    /// Fraction in `0.0..=1.0`
    pub progress: Option<f64>,
    /// Bytes per second
    pub download_speed: Option<u64>,
    pub upload_speed: Option<u64>,
    pub average_download_speed: Option<u64>,
    pub average_upload_speed: Option<u64>,
    pub seeder: Option<u32>,
    pub connected_seeder: Option<u32>,
    pub leecher: Option<u32>,
    pub connected_leecher: Option<u32>,
}

impl Torrent {
    /// Torrent with the given identity and every other property zeroed or absent.
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            category: Vec::new(),
            tracker: Vec::new(),
            status: TorrentStatus::Unknown,
            ratio: 0.0,
            size: 0,
            uploaded: 0,
            downloaded: None,
            create_time: 0,
            last_activity: 0,
            seeding_time: 0,
            downloading_time: 0,
            progress: None,
            download_speed: None,
            upload_speed: None,
            average_download_speed: None,
            average_upload_speed: None,
            seeder: None,
            connected_seeder: None,
            leecher: None,
            connected_leecher: None,
        }
    }

    /// Ratio usable in numeric comparisons: negative → +inf, NaN → 0.0
    pub fn effective_ratio(&self) -> f64 {
        if self.ratio.is_nan() {
            tracing::warn!(
                "Torrent {} reports a non-numeric ratio, treating it as 0.0",
                self.name
            );
            0.0
        } else if self.ratio < 0.0 {
            f64::INFINITY
        } else {
            self.ratio
        }
    }

    /// Uploaded bytes relative to the torrent size (0.0 for empty torrents)
    pub fn upload_ratio(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.uploaded as f64 / self.size as f64
        }
    }

    pub fn display(&self) -> String {
        format!(
            "{} ({}): status={}, ratio={:.2}, size={}, uploaded={}, seeding_time={}s, categories=[{}]",
            self.name,
            self.hash,
            self.status,
            self.ratio,
            self.size,
            self.uploaded,
            self.seeding_time,
            self.category.join(", ")
        )
    }
}

// Identity is the info hash alone, so sets of snapshots behave like sets of torrents
impl PartialEq for Torrent {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Torrent {}

impl std::hash::Hash for Torrent {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&self.hash, state);
    }
}

impl PartialOrd for Torrent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Torrent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}
