use super::Filter;
use crate::TorrentSet;

/// Keeps torrents whose ratio lies in `[min_ratio, max_ratio]` (both inclusive)
///
/// Infinite ratios (negative sentinel) only pass when `max_ratio` is infinite.
#[derive(Debug, Clone, Copy)]
pub struct RatioFilter {
    min_ratio: f64,
    max_ratio: f64,
}

impl RatioFilter {
    pub fn new(min_ratio: Option<f64>, max_ratio: Option<f64>) -> Self {
        Self {
            min_ratio: min_ratio.unwrap_or(0.0),
            max_ratio: max_ratio.unwrap_or(f64::INFINITY),
        }
    }
}

impl Filter for RatioFilter {
    fn apply(&self, torrents: TorrentSet) -> TorrentSet {
        if self.is_pass_through() {
            return torrents;
        }

        torrents
            .into_iter()
            .filter(|t| {
                let ratio = t.effective_ratio();
                self.min_ratio <= ratio && ratio <= self.max_ratio
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "ratio"
    }

    #[allow(clippy::float_cmp)]
    fn is_pass_through(&self) -> bool {
        self.min_ratio == 0.0 && self.max_ratio == f64::INFINITY
    }
}
