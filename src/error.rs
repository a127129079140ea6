use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Login to {host} failed: {reason}")]
    LoginFailed { host: String, reason: String },

    #[error("External service error: {0}")]
    External(String),
}

/// Failure while a condition partitions the working set.
///
/// Fatal to the strategy being evaluated; nothing is retried.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(
        "Property '{property}' is not provided by the client, so condition '{condition}' cannot be evaluated"
    )]
    UnsupportedProperty {
        property: &'static str,
        condition: String,
    },

    #[error("Condition '{condition}' failed to query free space of {path:?}: {source}")]
    DiskUsage {
        condition: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EvaluationError {
    pub fn unsupported(property: &'static str, condition: impl Into<String>) -> Self {
        Self::UnsupportedProperty {
            property,
            condition: condition.into(),
        }
    }

    /// Configuration key of the condition that failed
    pub fn condition(&self) -> &str {
        match self {
            Self::UnsupportedProperty { condition, .. } | Self::DiskUsage { condition, .. } => {
                condition
            }
        }
    }

    /// Attributes the failure to `outer`, the condition that delegated to the failing one
    pub fn reported_by(mut self, outer: &str) -> Self {
        match &mut self {
            Self::UnsupportedProperty { condition, .. } | Self::DiskUsage { condition, .. } => {
                tracing::debug!("Condition '{condition}' failed inside '{outer}'");
                *condition = outer.to_string();
            }
        }
        self
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
