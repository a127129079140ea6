use crate::conditions::ExpressionError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("No tasks defined in configuration")]
    NoTasks,

    #[error("Unknown task: {name}")]
    UnknownTask { name: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid expression '{expression}': {reason}")]
    InvalidExpression {
        expression: String,
        reason: ExpressionError,
    },

    #[error(
        "Strategy '{strategy}' references condition '{reference}', which is not configured in that strategy"
    )]
    UnknownConditionReference { strategy: String, reference: String },

    #[error("The client '{client}' is not supported")]
    UnsupportedClient { client: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
