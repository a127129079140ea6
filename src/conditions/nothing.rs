use super::{Condition, Partition};
use crate::error::EvaluationError;
use crate::{ClientStatus, TorrentSet};

/// Condition that never removes anything (placeholder to toggle a strategy off)
pub struct NothingCondition;

impl Condition for NothingCondition {
    fn apply(
        &self,
        _status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        Ok(Partition::keep_all(torrents))
    }

    fn name(&self) -> &'static str {
        "nothing"
    }
}
