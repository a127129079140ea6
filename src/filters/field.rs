use super::Filter;
use crate::{Torrent, TorrentSet};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Category,
    Status,
    Tracker,
}

impl FilterField {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Status => "status",
            Self::Tracker => "tracker",
        }
    }
}

/// Accept/reject filter over one torrent property
///
/// A torrent passes when (`all` is set or one of its values is accepted) and
/// none of its values is rejected. Rejection always wins.
///
/// - Category: exact match against each category of the torrent
/// - Status: case-insensitive match against the status name
/// - Tracker: match against the full tracker URL or its host name
#[derive(Debug, Clone)]
pub struct FieldFilter {
    field: FilterField,
    all: bool,
    accept: Vec<String>,
    reject: Vec<String>,
}

impl FieldFilter {
    pub fn new(field: FilterField, all: bool, accept: Vec<String>, reject: Vec<String>) -> Self {
        let normalize = |values: Vec<String>| -> Vec<String> {
            if field == FilterField::Status {
                values.into_iter().map(|v| v.to_lowercase()).collect()
            } else {
                values
            }
        };

        Self {
            field,
            all,
            accept: normalize(accept),
            reject: normalize(reject),
        }
    }

    pub fn category(all: bool, accept: Vec<String>, reject: Vec<String>) -> Self {
        Self::new(FilterField::Category, all, accept, reject)
    }

    pub fn status(all: bool, accept: Vec<String>, reject: Vec<String>) -> Self {
        Self::new(FilterField::Status, all, accept, reject)
    }

    pub fn tracker(all: bool, accept: Vec<String>, reject: Vec<String>) -> Self {
        Self::new(FilterField::Tracker, all, accept, reject)
    }

    fn values<'a>(&self, torrent: &'a Torrent) -> Vec<Cow<'a, str>> {
        match self.field {
            FilterField::Category => torrent
                .category
                .iter()
                .map(|c| Cow::Borrowed(c.as_str()))
                .collect(),
            FilterField::Status => {
                vec![Cow::Owned(torrent.status.as_str().to_lowercase())]
            }
            FilterField::Tracker => {
                let mut values = Vec::with_capacity(torrent.tracker.len() * 2);
                for url in &torrent.tracker {
                    values.push(Cow::Borrowed(url.as_str()));
                    if let Some(host) = tracker_host(url) {
                        values.push(Cow::Owned(host));
                    }
                }
                values
            }
        }
    }

    fn passes(&self, torrent: &Torrent) -> bool {
        let values = self.values(torrent);
        let intersects = |list: &[String]| values.iter().any(|v| list.iter().any(|l| l == v));

        (self.all || intersects(&self.accept)) && !intersects(&self.reject)
    }
}

fn tracker_host(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

impl Filter for FieldFilter {
    fn apply(&self, torrents: TorrentSet) -> TorrentSet {
        if self.is_pass_through() {
            return torrents;
        }
        torrents.into_iter().filter(|t| self.passes(t)).collect()
    }

    fn name(&self) -> &'static str {
        self.field.name()
    }

    fn is_pass_through(&self) -> bool {
        self.all && self.reject.is_empty()
    }
}
