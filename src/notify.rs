use crate::units::{format_bytes, format_seconds};
use crate::{ClientStatus, Torrent};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

/// Receives every torrent that was actually removed
pub trait Notifier {
    fn notify_removed(&self, torrent: &Torrent);
}

const EMBED_COLOR: u32 = 15158332;

/// Posts one embed per removed torrent to a Discord webhook
///
/// Delivery problems are logged and otherwise ignored: a failed notification
/// never affects the removal itself.
pub struct DiscordNotifier {
    webhook_url: String,
    client: Option<Client>,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| tracing::error!("Failed to build Discord HTTP client: {e}"))
            .ok();

        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }
}

impl Notifier for DiscordNotifier {
    fn notify_removed(&self, torrent: &Torrent) {
        let Some(client) = &self.client else {
            return;
        };

        let payload = embed(torrent, ClientStatus::now().timestamp);
        let result = client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status);

        match result {
            Ok(_) => tracing::debug!("Sent Discord notification for {}", torrent.name),
            Err(e) => tracing::error!(
                "Failed to send Discord notification for {}: {e}",
                torrent.name
            ),
        }
    }
}

fn tracker_hosts(torrent: &Torrent) -> Vec<String> {
    torrent
        .tracker
        .iter()
        .map(|url| {
            reqwest::Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| url.clone())
        })
        .collect()
}

fn or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        values.join(", ")
    }
}

/// Webhook payload for a removed torrent; `now` dates the last activity
fn embed(torrent: &Torrent, now: i64) -> Value {
    let idle = u64::try_from(now.saturating_sub(torrent.last_activity)).unwrap_or(0);
    let field = |name: &str, value: String, inline: bool| {
        json!({ "name": name, "value": value, "inline": inline })
    };

    json!({
        "embeds": [{
            "title": format!("Torrent Removed: {}", torrent.name),
            "color": EMBED_COLOR,
            "fields": [
                field("Ratio", format!("{:.2}", torrent.ratio), true),
                field("Uploaded", format_bytes(torrent.uploaded), true),
                field("Total Size", format_bytes(torrent.size), true),
                field("Seeding Time", format_seconds(torrent.seeding_time), true),
                field("Last Activity", format!("{} ago", format_seconds(idle)), true),
                field("Category", or_na(&torrent.category), true),
                field("Trackers", or_na(&tracker_hosts(torrent)), false),
            ],
            "footer": { "text": "Auto Remove Torrents" }
        }]
    })
}
