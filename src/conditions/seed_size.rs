use super::{Condition, GIB, Partition, SortAction};
use crate::error::EvaluationError;
use crate::{ClientStatus, TorrentSet};

/// Caps the total size of the working set at `limit_gib`
///
/// When the sum of sizes exceeds the limit, torrents are removed in `action`
/// order until the remaining total fits.
pub struct SeedSizeCondition {
    limit_gib: f64,
    action: SortAction,
}

impl SeedSizeCondition {
    pub const fn new(limit_gib: f64, action: SortAction) -> Self {
        Self { limit_gib, action }
    }
}

impl Condition for SeedSizeCondition {
    fn apply(
        &self,
        _status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        let limit = self.limit_gib * GIB;
        let mut total: f64 = torrents.iter().map(|t| t.size as f64).sum();
        if total <= limit {
            return Ok(Partition::keep_all(torrents));
        }

        let mut remove = TorrentSet::new();
        for torrent in self.action.removal_order(torrents, self.name())? {
            if total <= limit {
                break;
            }
            total -= torrent.size as f64;
            remove.insert(torrent);
        }

        Ok(Partition::split(torrents, &remove))
    }

    fn name(&self) -> &'static str {
        "seed_size"
    }
}
