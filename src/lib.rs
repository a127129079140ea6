#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cli;
pub mod client;
pub mod client_status;
pub mod conditions;
pub mod config;
pub mod disk;
pub mod error;
pub mod events;
pub mod factory;
pub mod filters;
pub mod logging;
pub mod notify;
pub mod strategy;
pub mod task;
pub mod torrent;
pub mod units;

pub use cli::{Cli, Commands, RunArgs, default_config_path};
pub use client::{FailedRemoval, QBittorrentClient, RemovalReport, TorrentClient, build_client};
pub use client_status::ClientStatus;
pub use conditions::{
    Condition, ConditionParser, Expression, ExpressionError, Partition, SortAction,
    ThresholdKind,
};
pub use config::{AppConfig, ClientKind, ConditionConfig, ConfigError, StrategyConfig, TaskConfig};
pub use disk::{DiskOperations, RealDisk};
pub use error::{AppError, EvaluationError, Result};
pub use events::{EvaluationEvent, EventSink, NoopSink, TracingSink};
pub use filters::{FieldFilter, Filter, FilterField, RatioFilter};
pub use logging::{LogFormat, init_tracing};
pub use notify::{DiscordNotifier, Notifier};
pub use strategy::Strategy;
pub use task::{Task, TaskReport};
pub use torrent::{Torrent, TorrentSet, TorrentStatus};
