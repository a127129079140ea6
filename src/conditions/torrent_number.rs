use super::{Condition, Partition, SortAction};
use crate::error::EvaluationError;
use crate::{ClientStatus, TorrentSet};

/// Keeps at most `limit` torrents, removing the surplus in `action` order
pub struct TorrentNumberCondition {
    limit: usize,
    action: SortAction,
}

impl TorrentNumberCondition {
    pub const fn new(limit: usize, action: SortAction) -> Self {
        Self { limit, action }
    }
}

impl Condition for TorrentNumberCondition {
    fn apply(
        &self,
        _status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        if torrents.len() <= self.limit {
            return Ok(Partition::keep_all(torrents));
        }

        let surplus = torrents.len() - self.limit;
        let remove: TorrentSet = self
            .action
            .removal_order(torrents, self.name())?
            .into_iter()
            .take(surplus)
            .collect();

        Ok(Partition::split(torrents, &remove))
    }

    fn name(&self) -> &'static str {
        "maximum_number"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Torrent;
    use crate::conditions::test_support::{hashes, set};

    fn torrents() -> TorrentSet {
        set((1..=5u32)
            .map(|i| Torrent {
                create_time: i64::from(i) * 100,
                size: u64::from(i),
                ..Torrent::new(format!("t{i}"), format!("t{i}"))
            })
            .collect())
    }

    #[test]
    fn test_under_limit_keeps_all() {
        let condition = TorrentNumberCondition::new(5, SortAction::RemoveOldSeeds);
        let partition = condition.apply(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(partition.remain.len(), 5);
        assert!(partition.remove.is_empty());
    }

    #[test]
    fn test_removes_oldest_surplus() {
        let condition = TorrentNumberCondition::new(3, SortAction::RemoveOldSeeds);
        let partition = condition.apply(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(&partition.remove), vec!["t1", "t2"]);
        assert_eq!(hashes(&partition.remain), vec!["t3", "t4", "t5"]);
    }

    #[test]
    fn test_removes_biggest_surplus() {
        let condition = TorrentNumberCondition::new(4, SortAction::RemoveBigSeeds);
        let partition = condition.apply(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(&partition.remove), vec!["t5"]);
    }

    #[test]
    fn test_zero_limit_removes_everything() {
        let condition = TorrentNumberCondition::new(0, SortAction::RemoveNewSeeds);
        let partition = condition.apply(&ClientStatus::new(0), &torrents()).unwrap();
        assert!(partition.remain.is_empty());
        assert_eq!(partition.remove.len(), 5);
    }

    #[test]
    fn test_unsupported_sort_key_names_condition() {
        let condition = TorrentNumberCondition::new(1, SortAction::RemoveSlowUploadSeeds);
        let err = condition.apply(&ClientStatus::new(0), &torrents()).unwrap_err();
        assert_eq!(err.condition(), "maximum_number");
    }
}
