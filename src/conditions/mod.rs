mod action;
mod expression;
mod free_space;
mod nothing;
mod seed_size;
mod threshold;
mod torrent_number;

pub use action::SortAction;
pub use expression::{ConditionParser, Expression, ExpressionError};
pub use free_space::{FreeSpaceCondition, FreeSpaceSource};
pub use nothing::NothingCondition;
pub use seed_size::SeedSizeCondition;
pub use threshold::{Bound, ThresholdCondition, ThresholdKind};
pub use torrent_number::TorrentNumberCondition;

use crate::error::EvaluationError;
use crate::{ClientStatus, Torrent, TorrentSet};

pub(crate) const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Outcome of a condition: every input torrent ends up in exactly one side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub remain: TorrentSet,
    pub remove: TorrentSet,
}

impl Partition {
    /// Nothing is removed
    pub fn keep_all(torrents: &TorrentSet) -> Self {
        Self {
            remain: torrents.clone(),
            remove: TorrentSet::new(),
        }
    }

    /// Splits `torrents` given the torrents to remove; entries of `remove`
    /// that are not part of `torrents` are dropped
    pub fn split(torrents: &TorrentSet, remove: &TorrentSet) -> Self {
        let (remove, remain): (TorrentSet, TorrentSet) =
            torrents.iter().cloned().partition(|t| remove.contains(t));
        Self { remain, remove }
    }

    /// Splits `torrents` by a fallible predicate returning `true` for removal
    pub fn by<F>(torrents: &TorrentSet, mut should_remove: F) -> Result<Self, EvaluationError>
    where
        F: FnMut(&Torrent) -> Result<bool, EvaluationError>,
    {
        let mut partition = Self::default();
        for torrent in torrents {
            if should_remove(torrent)? {
                partition.remove.insert(torrent.clone());
            } else {
                partition.remain.insert(torrent.clone());
            }
        }
        Ok(partition)
    }
}

/// Partitions the current working set into torrents to keep and torrents to remove
pub trait Condition: Send + Sync {
    fn apply(
        &self,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError>;

    /// Configuration key this condition was built from
    fn name(&self) -> &str;
}


#[cfg(test)]
mod tests {
    use super::test_support::{hashes, set};
    use super::*;

    #[test]
    fn test_keep_all() {
        let input = set(vec![Torrent::new("a", "a"), Torrent::new("b", "b")]);
        let partition = Partition::keep_all(&input);
        assert_eq!(partition.remain, input);
        assert!(partition.remove.is_empty());
    }

    #[test]
    fn test_split_ignores_foreign_torrents() {
        let input = set(vec![Torrent::new("a", "a"), Torrent::new("b", "b")]);
        let remove = set(vec![Torrent::new("b", "b"), Torrent::new("z", "z")]);
        let partition = Partition::split(&input, &remove);
        assert_eq!(hashes(&partition.remain), vec!["a"]);
        assert_eq!(hashes(&partition.remove), vec!["b"]);
    }

    #[test]
    fn test_by_propagates_error() {
        let input = set(vec![Torrent::new("a", "a")]);
        let result = Partition::by(&input, |_| {
            Err(EvaluationError::unsupported("seeder", "max_seeder"))
        });
        assert!(matches!(
            result,
            Err(EvaluationError::UnsupportedProperty { property: "seeder", .. })
        ));
    }

    #[test]
    fn test_conditions_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn Condition>>();
    }
}
