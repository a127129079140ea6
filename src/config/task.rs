use super::ordered;
use super::{ConfigError, StrategyConfig};
use lazy_regex::{Regex, regex};
use serde::Deserialize;
use std::fmt;

/// Torrent client a task talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ClientKind {
    QBittorrent,
}

impl ClientKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QBittorrent => "qbittorrent",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ClientKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "qbittorrent" | "qbit" => Ok(Self::QBittorrent),
            _ => Err(ConfigError::UnsupportedClient { client: value }),
        }
    }
}

/// One client plus the strategies evaluated against it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub client: ClientKind,

    /// Web UI base URL, e.g. `http://127.0.0.1:8080`
    #[serde(deserialize_with = "deserialize_host")]
    pub host: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Delete downloaded data together with the torrent
    #[serde(default)]
    pub delete_data: bool,

    #[serde(default)]
    pub discord_webhook_url: Option<String>,

    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub strategies: Vec<(String, StrategyConfig)>,
}

fn deserialize_host<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let host = String::deserialize(deserializer)?;
    Ok(host.trim_end_matches('/').to_string())
}

impl TaskConfig {
    /// Replaces `$(NAME)` in host and credentials with environment variables
    pub fn substitute_env(&mut self) {
        self.substitute_with(|name| std::env::var(name).ok());
    }

    /// Same as [`Self::substitute_env`] with an explicit variable lookup
    pub fn substitute_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for field in [&mut self.host, &mut self.username, &mut self.password] {
            if let Some(value) = substitute(field, &lookup) {
                *field = value;
            }
        }
        self.host = self.host.trim_end_matches('/').to_string();
    }
}

fn substitute<F>(value: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re: &Regex = regex!(r"^\$\(([^)]+)\)$");
    let name = re.captures(value)?.get(1)?.as_str();
    let resolved = lookup(name);
    if resolved.is_none() {
        tracing::warn!("Environment variable '{name}' is not set, keeping '{value}'");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r"
client: qBittorrent
host: http://127.0.0.1:8080/
username: admin
password: adminadmin
strategies:
  second:
    ratio: 1
  first:
    seeding_time: 100
";

    #[test]
    fn test_deserialize_task() {
        let task: TaskConfig = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(task.client, ClientKind::QBittorrent);
        assert_eq!(task.host, "http://127.0.0.1:8080");
        assert_eq!(task.username, "admin");
        assert!(!task.delete_data);
        assert_eq!(task.discord_webhook_url, None);
        let names: Vec<_> = task.strategies.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_unsupported_client() {
        let err = serde_yaml::from_str::<TaskConfig>("client: transmission\nhost: x").unwrap_err();
        assert!(err.to_string().contains("transmission"));
    }

    #[test]
    fn test_client_kind_case_insensitive() {
        assert_eq!(
            ClientKind::try_from("QBITTORRENT".to_string()).unwrap(),
            ClientKind::QBittorrent
        );
        assert_eq!(ClientKind::QBittorrent.to_string(), "qbittorrent");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "client: qbittorrent\nhost: x\nport: 1";
        assert!(serde_yaml::from_str::<TaskConfig>(yaml).is_err());
    }

    #[test]
    fn test_env_substitution() {
        let mut task: TaskConfig = serde_yaml::from_str(
            "client: qbittorrent\nhost: $(QB_HOST)\nusername: $(QB_USER)\npassword: $(QB_MISSING)",
        )
        .unwrap();
        task.substitute_with(|name| match name {
            "QB_HOST" => Some("http://seedbox:8080/".to_string()),
            "QB_USER" => Some("alice".to_string()),
            _ => None,
        });
        assert_eq!(task.host, "http://seedbox:8080");
        assert_eq!(task.username, "alice");
        assert_eq!(task.password, "$(QB_MISSING)");
    }

    #[test]
    fn test_env_substitution_needs_whole_value() {
        let yaml = "client: qbittorrent\nhost: x\nusername: $(VAR)-admin\npassword: pre$(VAR)";
        let mut task: TaskConfig = serde_yaml::from_str(yaml).unwrap();
        task.substitute_with(|_| Some("secret".to_string()));
        // text on either side of the reference keeps the value literal
        assert_eq!(task.username, "$(VAR)-admin");
        assert_eq!(task.password, "pre$(VAR)");
    }
}
