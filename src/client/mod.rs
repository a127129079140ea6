mod qbittorrent;

pub use qbittorrent::QBittorrentClient;

use crate::config::ClientKind;
use crate::error::Result;
use crate::{ClientStatus, Torrent};

/// Torrent that the client refused to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRemoval {
    pub hash: String,
    pub reason: String,
}

/// Outcome of one removal request, per hash
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<String>,
    pub failed: Vec<FailedRemoval>,
}

/// Web API of a torrent client
pub trait TorrentClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    fn version(&self) -> Result<String>;

    fn api_version(&self) -> Result<String>;

    fn client_status(&self) -> Result<ClientStatus>;

    /// Info hashes of every torrent in the client
    fn torrents_list(&self) -> Result<Vec<String>>;

    fn torrent_properties(&self, hash: &str) -> Result<Torrent>;

    fn remove_torrents(&self, hashes: &[String], delete_data: bool) -> Result<RemovalReport>;
}

pub fn build_client(kind: ClientKind, host: &str) -> Result<Box<dyn TorrentClient>> {
    match kind {
        ClientKind::QBittorrent => Ok(Box::new(QBittorrentClient::new(host)?)),
    }
}
