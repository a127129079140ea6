use crate::error::EvaluationError;
use crate::{Torrent, TorrentSet};
use serde::Deserialize;
use std::sync::Arc;

/// Order in which count and space conditions pick torrents for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortAction {
    /// Oldest added first
    #[default]
    RemoveOldSeeds,
    RemoveNewSeeds,
    /// Largest first
    RemoveBigSeeds,
    RemoveSmallSeeds,
    /// Most recently active first
    RemoveActiveSeeds,
    RemoveInactiveSeeds,
    RemoveFastUploadSeeds,
    RemoveSlowUploadSeeds,
    RemoveFastDownloadSeeds,
    RemoveSlowDownloadSeeds,
}

impl SortAction {
    const fn descending(self) -> bool {
        matches!(
            self,
            Self::RemoveNewSeeds
                | Self::RemoveBigSeeds
                | Self::RemoveActiveSeeds
                | Self::RemoveFastUploadSeeds
                | Self::RemoveFastDownloadSeeds
        )
    }

    fn key(self, torrent: &Torrent) -> Result<i128, &'static str> {
        match self {
            Self::RemoveOldSeeds | Self::RemoveNewSeeds => Ok(i128::from(torrent.create_time)),
            Self::RemoveBigSeeds | Self::RemoveSmallSeeds => Ok(i128::from(torrent.size)),
            Self::RemoveActiveSeeds | Self::RemoveInactiveSeeds => {
                Ok(i128::from(torrent.last_activity))
            }
            Self::RemoveFastUploadSeeds | Self::RemoveSlowUploadSeeds => torrent
                .upload_speed
                .map(i128::from)
                .ok_or("upload_speed"),
            Self::RemoveFastDownloadSeeds | Self::RemoveSlowDownloadSeeds => torrent
                .download_speed
                .map(i128::from)
                .ok_or("download_speed"),
        }
    }

    /// Torrents in removal order. Ties are broken by hash, ascending.
    pub fn removal_order(
        self,
        torrents: &TorrentSet,
        condition: &str,
    ) -> Result<Vec<Arc<Torrent>>, EvaluationError> {
        let mut keyed = torrents
            .iter()
            .map(|t| {
                self.key(t)
                    .map(|key| (key, Arc::clone(t)))
                    .map_err(|property| EvaluationError::unsupported(property, condition))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let descending = self.descending();
        keyed.sort_by(|(k1, t1), (k2, t2)| {
            let primary = if descending { k2.cmp(k1) } else { k1.cmp(k2) };
            primary.then_with(|| t1.hash.cmp(&t2.hash))
        });

        Ok(keyed.into_iter().map(|(_, t)| t).collect())
    }
}
