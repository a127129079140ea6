use super::{FailedRemoval, RemovalReport, TorrentClient};
use crate::error::{AppError, Result};
use crate::{ClientStatus, Torrent, TorrentStatus};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{COOKIE, HeaderMap, REFERER, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// qBittorrent Web API v2 client
pub struct QBittorrentClient {
    host: String,
    client: Client,
    sid: Option<String>,
}

impl QBittorrentClient {
    pub fn new(host: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::External(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
            sid: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{path}", self.host)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.sid {
            Some(sid) => request.header(COOKIE, format!("SID={sid}")),
            None => request,
        }
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<Response> {
        let response = self
            .with_session(request)
            .send()
            .map_err(|e| AppError::External(format!("Request to {path} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "qBittorrent returned {} for {path}",
                response.status()
            )));
        }
        Ok(response)
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let response = self.send(path, self.client.get(self.url(path)))?;
        response
            .text()
            .map(|text| text.trim().to_string())
            .map_err(|e| AppError::External(format!("Failed to read {path} response: {e}")))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(path, self.client.get(self.url(path)).query(query))?;
        let body = response
            .text()
            .map_err(|e| AppError::External(format!("Failed to read {path} response: {e}")))?;
        tracing::trace!("{path} response: {body}");
        Ok(serde_json::from_str(&body)?)
    }
}

impl TorrentClient for QBittorrentClient {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let path = "auth/login";
        let response = self
            .client
            .post(self.url(path))
            .header(REFERER, &self.host)
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(|e| AppError::LoginFailed {
                host: self.host.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let sid = session_cookie(response.headers());
        let body = response.text().unwrap_or_default();

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::LoginFailed {
                host: self.host.clone(),
                reason: "IP is banned for too many failed login attempts".to_string(),
            });
        }
        if !status.is_success() || body.trim() != "Ok." {
            return Err(AppError::LoginFailed {
                host: self.host.clone(),
                reason: format!("{status}: {}", body.trim()),
            });
        }

        // With authentication disabled for the client's subnet there is no cookie
        self.sid = sid;
        Ok(())
    }

    fn version(&self) -> Result<String> {
        self.get_text("app/version")
    }

    fn api_version(&self) -> Result<String> {
        self.get_text("app/webapiVersion")
    }

    fn client_status(&self) -> Result<ClientStatus> {
        let main: MainData = self.get_json("sync/maindata", &[])?;
        Ok(main.server_state.into_status(ClientStatus::now()))
    }

    fn torrents_list(&self) -> Result<Vec<String>> {
        let torrents: Vec<TorrentInfo> = self.get_json("torrents/info", &[])?;
        Ok(torrents.into_iter().map(|t| t.hash).collect())
    }

    fn torrent_properties(&self, hash: &str) -> Result<Torrent> {
        let info: Vec<TorrentInfo> = self.get_json("torrents/info", &[("hashes", hash)])?;
        let info = info.into_iter().next().ok_or_else(|| {
            AppError::External(format!("Torrent {hash} is not known to the client"))
        })?;
        let properties: TorrentProperties =
            self.get_json("torrents/properties", &[("hash", hash)])?;
        let trackers: Vec<TrackerEntry> = self.get_json("torrents/trackers", &[("hash", hash)])?;

        Ok(build_torrent(info, &properties, trackers))
    }

    fn remove_torrents(&self, hashes: &[String], delete_data: bool) -> Result<RemovalReport> {
        let path = "torrents/delete";
        let joined = hashes.join("|");
        let delete_files = if delete_data { "true" } else { "false" };
        let request = self
            .client
            .post(self.url(path))
            .form(&[("hashes", joined.as_str()), ("deleteFiles", delete_files)]);

        // The endpoint answers for the whole batch, so every hash shares the outcome
        Ok(match self.send(path, request) {
            Ok(_) => RemovalReport {
                removed: hashes.to_vec(),
                failed: Vec::new(),
            },
            Err(e) => RemovalReport {
                removed: Vec::new(),
                failed: hashes
                    .iter()
                    .map(|hash| FailedRemoval {
                        hash: hash.clone(),
                        reason: e.to_string(),
                    })
                    .collect(),
            },
        })
    }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .find_map(|pair| pair.trim().strip_prefix("SID="))
        .map(str::to_string)
}

fn map_state(state: &str) -> TorrentStatus {
    match state {
        "downloading" | "stalledDL" | "metaDL" | "forcedMetaDL" | "forcedDL" => {
            TorrentStatus::Downloading
        }
        "queuedDL" | "queuedUP" => TorrentStatus::Queued,
        "uploading" | "stalledUP" | "forcedUP" => TorrentStatus::Uploading,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentStatus::Checking,
        "pausedDL" | "pausedUP" => TorrentStatus::Paused,
        "stoppedDL" | "stoppedUP" => TorrentStatus::Stopped,
        "error" | "missingFiles" => TorrentStatus::Error,
        _ => TorrentStatus::Unknown,
    }
}

fn build_torrent(
    info: TorrentInfo,
    properties: &TorrentProperties,
    trackers: Vec<TrackerEntry>,
) -> Torrent {
    let category = if info.category.is_empty() {
        Vec::new()
    } else {
        vec![info.category]
    };
    let tracker = trackers
        .into_iter()
        .map(|t| t.url)
        .filter(|url| !url.starts_with("**"))
        .collect();

    Torrent {
        hash: info.hash,
        name: info.name,
        category,
        tracker,
        status: map_state(&info.state),
        ratio: info.ratio,
        size: info.size,
        uploaded: info.uploaded,
        downloaded: Some(info.downloaded),
        create_time: info.added_on,
        last_activity: info.last_activity,
        seeding_time: properties.seeding_time,
        downloading_time: properties
            .time_elapsed
            .saturating_sub(properties.seeding_time),
        progress: Some(info.progress),
        download_speed: Some(info.dlspeed),
        upload_speed: Some(info.upspeed),
        average_download_speed: Some(properties.dl_speed_avg),
        average_upload_speed: Some(properties.up_speed_avg),
        seeder: Some(info.num_complete),
        connected_seeder: Some(info.num_seeds),
        leecher: Some(info.num_incomplete),
        connected_leecher: Some(info.num_leechs),
    }
}

// API response structures

#[derive(Debug, Deserialize)]
struct MainData {
    #[serde(default)]
    server_state: ServerState,
}

#[derive(Debug, Default, Deserialize)]
struct ServerState {
    free_space_on_disk: Option<u64>,
    dl_info_speed: Option<u64>,
    up_info_speed: Option<u64>,
    alltime_dl: Option<u64>,
    alltime_ul: Option<u64>,
    dht_nodes: Option<u64>,
}

impl ServerState {
    fn into_status(self, mut status: ClientStatus) -> ClientStatus {
        status.free_space = self.free_space_on_disk;
        status.download_speed = self.dl_info_speed;
        status.upload_speed = self.up_info_speed;
        status.total_downloaded = self.alltime_dl;
        status.total_uploaded = self.alltime_ul;
        status.dht_nodes = self.dht_nodes;
        status
    }
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    hash: String,
    name: String,
    #[serde(default)]
    category: String,
    state: String,
    ratio: f64,
    size: u64,
    uploaded: u64,
    downloaded: u64,
    added_on: i64,
    last_activity: i64,
    progress: f64,
    dlspeed: u64,
    upspeed: u64,
    num_seeds: u32,
    num_complete: u32,
    num_leechs: u32,
    num_incomplete: u32,
}

#[derive(Debug, Deserialize)]
struct TorrentProperties {
    seeding_time: u64,
    time_elapsed: u64,
    dl_speed_avg: u64,
    up_speed_avg: u64,
}

#[derive(Debug, Deserialize)]
struct TrackerEntry {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    const INFO: &str = r#"[{
        "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
        "name": "debian-12.iso",
        "category": "linux",
        "state": "stalledUP",
        "ratio": 2.5,
        "size": 657457152,
        "uploaded": 1643642880,
        "downloaded": 657457152,
        "added_on": 1700000000,
        "last_activity": 1700500000,
        "progress": 1.0,
        "dlspeed": 0,
        "upspeed": 2048,
        "num_seeds": 3,
        "num_complete": 120,
        "num_leechs": 1,
        "num_incomplete": 7,
        "eta": 8640000
    }]"#;

    const PROPERTIES: &str = r#"{
        "seeding_time": 400000,
        "time_elapsed": 401000,
        "dl_speed_avg": 5000000,
        "up_speed_avg": 1200,
        "save_path": "/downloads/"
    }"#;

    const TRACKERS: &str = r#"[
        {"url": "** [DHT] **", "status": 2},
        {"url": "** [PeX] **", "status": 2},
        {"url": "https://tracker.example.org/announce", "status": 2}
    ]"#;

    fn parse_torrent(info: &str) -> Torrent {
        let info: Vec<TorrentInfo> = serde_json::from_str(info).unwrap();
        let properties: TorrentProperties = serde_json::from_str(PROPERTIES).unwrap();
        let trackers: Vec<TrackerEntry> = serde_json::from_str(TRACKERS).unwrap();
        build_torrent(info.into_iter().next().unwrap(), &properties, trackers)
    }

    #[test]
    fn test_build_torrent() {
        let torrent = parse_torrent(INFO);
        assert_eq!(torrent.hash, "8c212779b4abde7c6bc608063a0d008b7e40ce32");
        assert_eq!(torrent.category, vec!["linux"]);
        assert_eq!(torrent.status, TorrentStatus::Uploading);
        assert_eq!(torrent.tracker, vec!["https://tracker.example.org/announce"]);
        assert_eq!(torrent.create_time, 1700000000);
        assert_eq!(torrent.seeding_time, 400000);
        assert_eq!(torrent.downloading_time, 1000);
        assert_eq!(torrent.upload_speed, Some(2048));
        assert_eq!(torrent.average_upload_speed, Some(1200));
        assert_eq!(torrent.seeder, Some(120));
        assert_eq!(torrent.connected_seeder, Some(3));
        assert_eq!(torrent.leecher, Some(7));
        assert_eq!(torrent.connected_leecher, Some(1));
    }

    #[test]
    fn test_empty_category_is_no_category() {
        let info = INFO.replace(r#""category": "linux""#, r#""category": """#);
        assert!(parse_torrent(&info).category.is_empty());
    }

    #[test]
    fn test_map_state() {
        assert_eq!(map_state("metaDL"), TorrentStatus::Downloading);
        assert_eq!(map_state("queuedUP"), TorrentStatus::Queued);
        assert_eq!(map_state("forcedUP"), TorrentStatus::Uploading);
        assert_eq!(map_state("checkingResumeData"), TorrentStatus::Checking);
        assert_eq!(map_state("pausedDL"), TorrentStatus::Paused);
        assert_eq!(map_state("stoppedUP"), TorrentStatus::Stopped);
        assert_eq!(map_state("missingFiles"), TorrentStatus::Error);
        assert_eq!(map_state("somethingNew"), TorrentStatus::Unknown);
    }

    #[test]
    fn test_server_state_into_status() {
        let main: MainData = serde_json::from_str(
            r#"{"rid": 1, "server_state": {"free_space_on_disk": 1024, "dht_nodes": 300, "alltime_ul": 5}}"#,
        )
        .unwrap();
        let status = main.server_state.into_status(ClientStatus::new(42));
        assert_eq!(status.timestamp, 42);
        assert_eq!(status.free_space, Some(1024));
        assert_eq!(status.dht_nodes, Some(300));
        assert_eq!(status.total_uploaded, Some(5));
        assert_eq!(status.download_speed, None);
    }

    #[test]
    fn test_maindata_without_server_state() {
        let main: MainData = serde_json::from_str(r#"{"rid": 1}"#).unwrap();
        let status = main.server_state.into_status(ClientStatus::new(0));
        assert_eq!(status.free_space, None);
    }

    #[test]
    fn test_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1; path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("SID=abc123; HttpOnly; path=/; SameSite=Strict"),
        );
        assert_eq!(session_cookie(&headers), Some("abc123".to_string()));
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_url() {
        let client = QBittorrentClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(client.url("app/version"), "http://127.0.0.1:8080/api/v2/app/version");
    }
}
