use crate::client::{RemovalReport, TorrentClient, build_client};
use crate::config::{ConfigError, TaskConfig};
use crate::error::Result;
use crate::factory::build_strategy;
use crate::notify::{DiscordNotifier, Notifier};
use crate::{Strategy, Torrent, TorrentSet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one task run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Torrents found in the client
    pub total: usize,
    /// Union of the remove lists of every strategy
    pub remove: TorrentSet,
    /// `None` in view mode or when there was nothing to remove
    pub removal: Option<RemovalReport>,
}

/// One configured client with its strategies
pub struct Task {
    name: String,
    config: TaskConfig,
    strategies: Vec<Strategy>,
    remove_enabled: bool,
}

impl Task {
    /// Builds every strategy up front; `remove_enabled = false` is view mode
    pub fn new(
        name: impl Into<String>,
        config: TaskConfig,
        remove_enabled: bool,
    ) -> std::result::Result<Self, ConfigError> {
        let strategies = config
            .strategies
            .iter()
            .map(|(strategy_name, strategy)| build_strategy(strategy_name, strategy))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let name = name.into();
        tracing::debug!(
            "Task '{name}': client {}, host {}, remove {}, delete data {}, strategies [{}]",
            config.client,
            config.host,
            remove_enabled,
            config.delete_data,
            strategies
                .iter()
                .map(Strategy::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            name,
            config,
            strategies,
            remove_enabled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connects to the configured client and runs the task against it
    pub fn run(&mut self) -> Result<TaskReport> {
        let mut client = build_client(self.config.client, &self.config.host)?;
        let notifier = self
            .config
            .discord_webhook_url
            .as_deref()
            .map(DiscordNotifier::new);
        self.execute(
            client.as_mut(),
            notifier.as_ref().map(|n| n as &dyn Notifier),
        )
    }

    pub fn execute(
        &mut self,
        client: &mut dyn TorrentClient,
        notifier: Option<&dyn Notifier>,
    ) -> Result<TaskReport> {
        tracing::info!("Running task '{}'...", self.name);

        tracing::info!("Logging in...");
        client.login(&self.config.username, &self.config.password)?;
        tracing::info!("Login successfully. The client is {}.", client.version()?);
        tracing::info!("WebUI API version: {}", client.api_version()?);

        let status = client.client_status()?;
        tracing::info!("{status}");

        let torrents = Self::fetch_torrents(client)?;

        let mut remove = TorrentSet::new();
        for strategy in &mut self.strategies {
            strategy.execute(&status, &torrents)?;
            remove.extend(strategy.remove_list().iter().cloned());
        }

        let mut report = TaskReport {
            total: torrents.len(),
            remove,
            removal: None,
        };

        if !self.remove_enabled {
            for torrent in &report.remove {
                tracing::info!("Would remove: {}", torrent.display());
            }
        } else if !report.remove.is_empty() {
            report.removal = Some(self.remove_torrents(client, notifier, &report.remove)?);
        }

        Ok(report)
    }

    fn fetch_torrents(client: &dyn TorrentClient) -> Result<TorrentSet> {
        tracing::info!("Getting all the torrents...");
        let mut torrents = TorrentSet::new();
        let mut last_report = Instant::now();

        for hash in client.torrents_list()? {
            torrents.insert(Arc::new(client.torrent_properties(&hash)?));
            if last_report.elapsed() > Duration::from_secs(1) {
                tracing::info!("Please wait... found {} torrent(s) so far.", torrents.len());
                last_report = Instant::now();
            }
        }

        tracing::info!("Found {} torrent(s) in the client.", torrents.len());
        Ok(torrents)
    }

    fn remove_torrents(
        &self,
        client: &dyn TorrentClient,
        notifier: Option<&dyn Notifier>,
        remove: &TorrentSet,
    ) -> Result<RemovalReport> {
        let by_hash: HashMap<&str, &Torrent> =
            remove.iter().map(|t| (t.hash.as_str(), t.as_ref())).collect();
        let hashes: Vec<String> = remove.iter().map(|t| t.hash.clone()).collect();
        let delete_data = self.config.delete_data;

        let report = client.remove_torrents(&hashes, delete_data)?;

        for hash in &report.removed {
            let Some(torrent) = by_hash.get(hash.as_str()) else {
                tracing::warn!("Client reported removal of unexpected torrent {hash}");
                continue;
            };
            if delete_data {
                tracing::info!("The torrent {} and its data have been removed.", torrent.name);
            } else {
                tracing::info!("The torrent {} has been removed.", torrent.name);
            }
            if let Some(notifier) = notifier {
                notifier.notify_removed(torrent);
            }
        }

        for failed in &report.failed {
            let name = by_hash
                .get(failed.hash.as_str())
                .map_or(failed.hash.as_str(), |t| t.name.as_str());
            if delete_data {
                tracing::error!(
                    "The torrent {name} and its data cannot be removed. Reason: {}",
                    failed.reason
                );
            } else {
                tracing::error!("The torrent {name} cannot be removed. Reason: {}", failed.reason);
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FailedRemoval;
    use crate::error::{AppError, EvaluationError};
    use crate::notify::test_support::RecordingNotifier;
    use crate::{ClientStatus, conditions::test_support::hashes};
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// In-memory client: fixed torrents, optional per-hash removal failures
    struct FakeClient {
        torrents: Vec<Torrent>,
        reject: HashSet<String>,
        logged_in: bool,
        removal_calls: RefCell<Vec<(Vec<String>, bool)>>,
    }

    impl FakeClient {
        fn new(torrents: Vec<Torrent>) -> Self {
            Self {
                torrents,
                reject: HashSet::new(),
                logged_in: false,
                removal_calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TorrentClient for FakeClient {
        fn login(&mut self, username: &str, _password: &str) -> Result<()> {
            if username == "wrong" {
                return Err(AppError::LoginFailed {
                    host: "fake".to_string(),
                    reason: "Fails.".to_string(),
                });
            }
            self.logged_in = true;
            Ok(())
        }

        fn version(&self) -> Result<String> {
            Ok("v5.0.0".to_string())
        }

        fn api_version(&self) -> Result<String> {
            Ok("2.11.2".to_string())
        }

        fn client_status(&self) -> Result<ClientStatus> {
            Ok(ClientStatus::new(1_000_000).with_free_space(0))
        }

        fn torrents_list(&self) -> Result<Vec<String>> {
            Ok(self.torrents.iter().map(|t| t.hash.clone()).collect())
        }

        fn torrent_properties(&self, hash: &str) -> Result<Torrent> {
            self.torrents
                .iter()
                .find(|t| t.hash == hash)
                .cloned()
                .ok_or_else(|| AppError::External(format!("unknown {hash}")))
        }

        fn remove_torrents(&self, hashes: &[String], delete_data: bool) -> Result<RemovalReport> {
            self.removal_calls
                .borrow_mut()
                .push((hashes.to_vec(), delete_data));
            let (failed, removed): (Vec<_>, Vec<_>) =
                hashes.iter().cloned().partition(|h| self.reject.contains(h));
            Ok(RemovalReport {
                removed,
                failed: failed
                    .into_iter()
                    .map(|hash| FailedRemoval {
                        hash,
                        reason: "torrent is locked".to_string(),
                    })
                    .collect(),
            })
        }
    }

    fn torrents() -> Vec<Torrent> {
        vec![
            Torrent {
                ratio: 3.0,
                seeding_time: 10,
                ..Torrent::new("a", "high ratio")
            },
            Torrent {
                ratio: 0.1,
                seeding_time: 100_000,
                ..Torrent::new("b", "long seed")
            },
            Torrent {
                ratio: 3.0,
                seeding_time: 100_000,
                ..Torrent::new("c", "both")
            },
            Torrent {
                ratio: 0.1,
                seeding_time: 10,
                ..Torrent::new("d", "neither")
            },
        ]
    }

    fn config(yaml_strategies: &str) -> TaskConfig {
        let yaml = format!(
            "client: qbittorrent\nhost: http://fake\nusername: admin\ndelete_data: true\nstrategies:\n{yaml_strategies}"
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    const TWO_STRATEGIES: &str = "  by_ratio:\n    ratio: 2\n  by_time:\n    seeding_time: 86400\n";

    #[test]
    fn test_union_across_strategies() {
        let mut task = Task::new("t", config(TWO_STRATEGIES), true).unwrap();
        let mut client = FakeClient::new(torrents());
        let notifier = RecordingNotifier::default();

        let report = task.execute(&mut client, Some(&notifier)).unwrap();

        assert!(client.logged_in);
        assert_eq!(report.total, 4);
        assert_eq!(hashes(&report.remove), vec!["a", "b", "c"]);
        let calls = client.removal_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (vec!["a".to_string(), "b".to_string(), "c".to_string()], true));
        assert_eq!(notifier.hashes(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_each_strategy_sees_full_snapshot() {
        // by_ratio takes a and c; with only b and d left, the cap of 3 would
        // never trigger, so d is removed only if by_count counts all four
        let strategies = concat!(
            "  by_ratio:\n    ratio: 2\n",
            "  by_count:\n    maximum_number:\n      limit: 3\n      action: remove-new-seeds\n",
        );
        let mut task = Task::new("t", config(strategies), true).unwrap();
        let aged: Vec<Torrent> = torrents()
            .into_iter()
            .zip(1..)
            .map(|(torrent, created)| Torrent {
                create_time: created,
                ..torrent
            })
            .collect();
        let mut client = FakeClient::new(aged);

        let report = task.execute(&mut client, None).unwrap();

        assert_eq!(hashes(&report.remove), vec!["a", "c", "d"]);
        assert_eq!(
            report.removal.map(|removal| removal.removed),
            Some(vec!["a".to_string(), "c".to_string(), "d".to_string()])
        );
    }

    #[test]
    fn test_view_mode_removes_nothing() {
        let mut task = Task::new("t", config(TWO_STRATEGIES), false).unwrap();
        let mut client = FakeClient::new(torrents());
        let notifier = RecordingNotifier::default();

        let report = task.execute(&mut client, Some(&notifier)).unwrap();

        assert_eq!(report.remove.len(), 3);
        assert_eq!(report.removal, None);
        assert!(client.removal_calls.borrow().is_empty());
        assert!(notifier.hashes().is_empty());
    }

    #[test]
    fn test_nothing_to_remove_skips_client_call() {
        let mut task = Task::new("t", config("  idle:\n    nothing: ~\n"), true).unwrap();
        let mut client = FakeClient::new(torrents());

        let report = task.execute(&mut client, None).unwrap();

        assert!(report.remove.is_empty());
        assert_eq!(report.removal, None);
        assert!(client.removal_calls.borrow().is_empty());
    }

    #[test]
    fn test_failures_reported_and_not_notified() {
        let mut task = Task::new("t", config(TWO_STRATEGIES), true).unwrap();
        let mut client = FakeClient::new(torrents());
        client.reject.insert("b".to_string());
        let notifier = RecordingNotifier::default();

        let report = task.execute(&mut client, Some(&notifier)).unwrap();
        let removal = report.removal.unwrap();

        assert_eq!(removal.removed, vec!["a", "c"]);
        assert_eq!(
            removal.failed,
            vec![FailedRemoval {
                hash: "b".to_string(),
                reason: "torrent is locked".to_string()
            }]
        );
        assert_eq!(notifier.hashes(), vec!["a", "c"]);
    }

    #[test]
    fn test_strategy_error_aborts_before_removal() {
        let strategies = "  by_ratio:\n    ratio: 2\n  broken:\n    max_seeder: 3\n";
        let mut task = Task::new("t", config(strategies), true).unwrap();
        let mut client = FakeClient::new(torrents());

        let err = task.execute(&mut client, None).unwrap_err();

        assert!(matches!(
            err,
            AppError::Evaluation(EvaluationError::UnsupportedProperty { .. })
        ));
        assert!(client.removal_calls.borrow().is_empty());
    }

    #[test]
    fn test_client_status_reaches_conditions() {
        // клиент сообщает 0 байт свободного места, remote_free_space удаляет по одному
        let strategies = "  space:\n    remote_free_space:\n      min: 0.000001\n      action: remove-small-seeds\n";
        let mut task = Task::new("t", config(strategies), true).unwrap();
        let mut sized = torrents();
        for (i, torrent) in sized.iter_mut().enumerate() {
            torrent.size = 1024 * (i as u64 + 1);
        }
        let mut client = FakeClient::new(sized);

        let report = task.execute(&mut client, None).unwrap();
        assert_eq!(hashes(&report.remove), vec!["a", "b"]);
    }

    #[test]
    fn test_login_failure() {
        let mut config = config(TWO_STRATEGIES);
        config.username = "wrong".to_string();
        let mut task = Task::new("t", config, true).unwrap();
        let mut client = FakeClient::new(torrents());

        let err = task.execute(&mut client, None).unwrap_err();
        assert!(matches!(err, AppError::LoginFailed { .. }));
    }

    #[test]
    fn test_invalid_strategy_rejected_at_build() {
        let result = Task::new("t", config("  s:\n    remove: ratio\n"), true);
        assert!(matches!(
            result,
            Err(ConfigError::UnknownConditionReference { .. })
        ));
    }
}
