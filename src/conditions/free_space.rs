use super::{Condition, GIB, Partition, SortAction};
use crate::error::EvaluationError;
use crate::{ClientStatus, TorrentSet};
use std::path::PathBuf;

/// Where the free space figure comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeSpaceSource {
    /// Filesystem holding this local path (`free_space`)
    Local(PathBuf),
    /// Free space reported by the client (`remote_free_space`)
    Remote,
}

/// Frees disk space by removing torrents while free space stays below `min_gib`
///
/// Every torrent picked for removal (in `action` order) is credited with its
/// size; removal stops once the projected free space reaches the minimum.
pub struct FreeSpaceCondition {
    source: FreeSpaceSource,
    min_gib: f64,
    action: SortAction,
}

impl FreeSpaceCondition {
    pub const fn new(source: FreeSpaceSource, min_gib: f64, action: SortAction) -> Self {
        Self {
            source,
            min_gib,
            action,
        }
    }

    fn free_space(&self, status: &ClientStatus) -> Result<u64, EvaluationError> {
        match &self.source {
            FreeSpaceSource::Local(path) => {
                status
                    .local_free_space(path)
                    .map_err(|source| EvaluationError::DiskUsage {
                        condition: self.name().to_string(),
                        path: path.clone(),
                        source,
                    })
            }
            FreeSpaceSource::Remote => status
                .free_space
                .ok_or_else(|| EvaluationError::unsupported("free_space", self.name())),
        }
    }
}

impl Condition for FreeSpaceCondition {
    fn apply(
        &self,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        let min = self.min_gib * GIB;
        let mut free = self.free_space(status)? as f64;
        if free >= min {
            return Ok(Partition::keep_all(torrents));
        }

        let mut remove = TorrentSet::new();
        for torrent in self.action.removal_order(torrents, self.name())? {
            if free >= min {
                break;
            }
            free += torrent.size as f64;
            remove.insert(torrent);
        }

        Ok(Partition::split(torrents, &remove))
    }

    fn name(&self) -> &'static str {
        match self.source {
            FreeSpaceSource::Local(_) => "free_space",
            FreeSpaceSource::Remote => "remote_free_space",
        }
    }
}
