use super::{Condition, GIB, Partition};
use crate::error::EvaluationError;
use crate::{ClientStatus, Torrent, TorrentSet};

const KIB: f64 = 1024.0;

/// Direction of a threshold trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Removed once the value reaches the threshold (`value >= threshold`)
    Upper,
    /// Removed while the value stays below the threshold (`value < threshold`)
    Lower,
}

/// Every condition that compares one numeric torrent property against a limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdKind {
    CreateTime,
    LastActivity,
    SeedingTime,
    DownloadingTime,
    Ratio,
    UploadRatio,
    MaxSize,
    MaxUpload,
    MaxDownload,
    MaxDownloadSpeed,
    MaxAverageDownloadSpeed,
    MinUploadSpeed,
    MinAverageUploadSpeed,
    MaxProgress,
    MaxSeeder,
    MaxConnectedSeeder,
    MinLeecher,
    MinConnectedLeecher,
}

impl ThresholdKind {
    pub const ALL: [Self; 18] = [
        Self::CreateTime,
        Self::LastActivity,
        Self::SeedingTime,
        Self::DownloadingTime,
        Self::Ratio,
        Self::UploadRatio,
        Self::MaxSize,
        Self::MaxUpload,
        Self::MaxDownload,
        Self::MaxDownloadSpeed,
        Self::MaxAverageDownloadSpeed,
        Self::MinUploadSpeed,
        Self::MinAverageUploadSpeed,
        Self::MaxProgress,
        Self::MaxSeeder,
        Self::MaxConnectedSeeder,
        Self::MinLeecher,
        Self::MinConnectedLeecher,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::CreateTime => "create_time",
            Self::LastActivity => "last_activity",
            Self::SeedingTime => "seeding_time",
            Self::DownloadingTime => "downloading_time",
            Self::Ratio => "ratio",
            Self::UploadRatio => "upload_ratio",
            Self::MaxSize => "max_size",
            Self::MaxUpload => "max_upload",
            Self::MaxDownload => "max_download",
            Self::MaxDownloadSpeed => "max_downloadspeed",
            Self::MaxAverageDownloadSpeed => "max_average_downloadspeed",
            Self::MinUploadSpeed => "min_uploadspeed",
            Self::MinAverageUploadSpeed => "min_average_uploadspeed",
            Self::MaxProgress => "max_progress",
            Self::MaxSeeder => "max_seeder",
            Self::MaxConnectedSeeder => "max_connected_seeder",
            Self::MinLeecher => "min_leecher",
            Self::MinConnectedLeecher => "min_connected_leecher",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub const fn bound(self) -> Bound {
        match self {
            Self::MinUploadSpeed
            | Self::MinAverageUploadSpeed
            | Self::MinLeecher
            | Self::MinConnectedLeecher => Bound::Lower,
            _ => Bound::Upper,
        }
    }

    /// Factor turning the configured value into the unit of the measured value
    /// (GiB → bytes, KiB/s → bytes/s)
    pub const fn scale(self) -> f64 {
        match self {
            Self::MaxSize | Self::MaxUpload | Self::MaxDownload => GIB,
            Self::MaxDownloadSpeed
            | Self::MaxAverageDownloadSpeed
            | Self::MinUploadSpeed
            | Self::MinAverageUploadSpeed => KIB,
            _ => 1.0,
        }
    }

    /// Measures the property this kind compares.
    /// `Err` carries the name of a property the client did not provide.
    pub fn measure(self, torrent: &Torrent, status: &ClientStatus) -> Result<f64, &'static str> {
        fn required<T: Into<f64>>(
            value: Option<T>,
            property: &'static str,
        ) -> Result<f64, &'static str> {
            value.map(Into::into).ok_or(property)
        }

        match self {
            Self::CreateTime => Ok((status.timestamp - torrent.create_time) as f64),
            Self::LastActivity => Ok((status.timestamp - torrent.last_activity) as f64),
            Self::SeedingTime => Ok(torrent.seeding_time as f64),
            Self::DownloadingTime => Ok(torrent.downloading_time as f64),
            Self::Ratio => Ok(torrent.effective_ratio()),
            Self::UploadRatio => Ok(torrent.upload_ratio()),
            Self::MaxSize => Ok(torrent.size as f64),
            Self::MaxUpload => Ok(torrent.uploaded as f64),
            Self::MaxDownload => required(torrent.downloaded.map(|v| v as f64), "downloaded"),
            Self::MaxDownloadSpeed => {
                required(torrent.download_speed.map(|v| v as f64), "download_speed")
            }
            Self::MaxAverageDownloadSpeed => required(
                torrent.average_download_speed.map(|v| v as f64),
                "average_download_speed",
            ),
            Self::MinUploadSpeed => {
                required(torrent.upload_speed.map(|v| v as f64), "upload_speed")
            }
            Self::MinAverageUploadSpeed => required(
                torrent.average_upload_speed.map(|v| v as f64),
                "average_upload_speed",
            ),
            Self::MaxProgress => required(torrent.progress.map(|p| p * 100.0), "progress"),
            Self::MaxSeeder => required(torrent.seeder, "seeder"),
            Self::MaxConnectedSeeder => required(torrent.connected_seeder, "connected_seeder"),
            Self::MinLeecher => required(torrent.leecher, "leecher"),
            Self::MinConnectedLeecher => required(torrent.connected_leecher, "connected_leecher"),
        }
    }
}

/// Condition that removes torrents whose measured property crosses a threshold
///
/// | key | compares | unit |
/// |---|---|---|
/// | `create_time`, `last_activity` | seconds since the timestamp | s |
/// | `seeding_time`, `downloading_time` | time spent | s |
/// | `ratio`, `upload_ratio` | share ratio, uploaded / size | - |
/// | `max_size`, `max_upload`, `max_download` | bytes | GiB |
/// | `*speed` | bytes per second | KiB/s |
/// | `max_progress` | completion | % |
/// | `*seeder`, `*leecher` | peers | count |
///
/// `min_*` keys are lower bounds, everything else is an upper bound.
pub struct ThresholdCondition {
    kind: ThresholdKind,
    threshold: f64,
}

impl ThresholdCondition {
    pub const fn new(kind: ThresholdKind, threshold: f64) -> Self {
        Self { kind, threshold }
    }

    pub const fn kind(&self) -> ThresholdKind {
        self.kind
    }

    fn crosses(&self, value: f64) -> bool {
        let limit = self.threshold * self.kind.scale();
        match self.kind.bound() {
            Bound::Upper => value >= limit,
            Bound::Lower => value < limit,
        }
    }
}

impl Condition for ThresholdCondition {
    fn apply(
        &self,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        Partition::by(torrents, |torrent| {
            let value = self
                .kind
                .measure(torrent, status)
                .map_err(|property| EvaluationError::unsupported(property, self.kind.key()))?;
            Ok(self.crosses(value))
        })
    }

    fn name(&self) -> &'static str {
        self.kind.key()
    }
}
