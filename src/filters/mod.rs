mod field;
mod ratio;

pub use field::{FieldFilter, FilterField};
pub use ratio::RatioFilter;

use crate::TorrentSet;

/// Narrows a working set. Never introduces a torrent absent from the input.
pub trait Filter: Send + Sync {
    fn apply(&self, torrents: TorrentSet) -> TorrentSet;
    fn name(&self) -> &str;

    /// `true` when `apply` returns its input unchanged for any input
    fn is_pass_through(&self) -> bool {
        false
    }
}
