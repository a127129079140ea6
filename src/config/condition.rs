use super::{ConfigError, Result};
use crate::conditions::{Expression, SortAction, ThresholdKind};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::PathBuf;

/// One configured condition. Every recognized strategy key maps to exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionConfig {
    Nothing,
    Threshold {
        kind: ThresholdKind,
        value: f64,
    },
    MaximumNumber {
        limit: usize,
        action: SortAction,
    },
    SeedSize {
        limit_gib: f64,
        action: SortAction,
    },
    FreeSpace {
        min_gib: f64,
        path: PathBuf,
        action: SortAction,
    },
    RemoteFreeSpace {
        min_gib: f64,
        action: SortAction,
    },
    Remove {
        expression: Expression,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CountSettings {
    limit: usize,
    #[serde(default)]
    action: SortAction,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SizeSettings {
    limit: f64,
    #[serde(default)]
    action: SortAction,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FreeSpaceSettings {
    min: f64,
    path: PathBuf,
    #[serde(default)]
    action: SortAction,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteFreeSpaceSettings {
    min: f64,
    #[serde(default)]
    action: SortAction,
}

impl ConditionConfig {
    /// Parses the value of a strategy key. `Ok(None)` when `key` is not a condition.
    pub fn from_entry(key: &str, value: &Value) -> Result<Option<Self>> {
        if let Some(kind) = ThresholdKind::from_key(key) {
            return Ok(Some(Self::Threshold {
                kind,
                value: non_negative(key, number(key, value)?)?,
            }));
        }

        let config = match key {
            "nothing" => Self::Nothing,
            "maximum_number" => {
                let settings: CountSettings = if value.is_mapping() {
                    from_mapping(key, value)?
                } else {
                    let limit = value.as_u64().ok_or_else(|| {
                        ConfigError::invalid(key, "expected a non-negative integer")
                    })?;
                    CountSettings {
                        limit: usize::try_from(limit)
                            .map_err(|_| ConfigError::invalid(key, "limit is too large"))?,
                        action: SortAction::default(),
                    }
                };
                Self::MaximumNumber {
                    limit: settings.limit,
                    action: settings.action,
                }
            }
            "seed_size" => {
                let settings: SizeSettings = if value.is_mapping() {
                    from_mapping(key, value)?
                } else {
                    SizeSettings {
                        limit: number(key, value)?,
                        action: SortAction::default(),
                    }
                };
                Self::SeedSize {
                    limit_gib: non_negative(key, settings.limit)?,
                    action: settings.action,
                }
            }
            "free_space" => {
                let settings: FreeSpaceSettings = from_mapping(key, value)?;
                Self::FreeSpace {
                    min_gib: non_negative(key, settings.min)?,
                    path: settings.path,
                    action: settings.action,
                }
            }
            "remote_free_space" => {
                let settings: RemoteFreeSpaceSettings = if value.is_mapping() {
                    from_mapping(key, value)?
                } else {
                    RemoteFreeSpaceSettings {
                        min: number(key, value)?,
                        action: SortAction::default(),
                    }
                };
                Self::RemoteFreeSpace {
                    min_gib: non_negative(key, settings.min)?,
                    action: settings.action,
                }
            }
            "remove" => {
                let source = value
                    .as_str()
                    .ok_or_else(|| ConfigError::invalid(key, "expected an expression string"))?;
                let expression = source
                    .parse()
                    .map_err(|reason| ConfigError::InvalidExpression {
                        expression: source.to_string(),
                        reason,
                    })?;
                Self::Remove { expression }
            }
            _ => return Ok(None),
        };

        Ok(Some(config))
    }

    /// Configuration key of this condition
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Threshold { kind, .. } => kind.key(),
            Self::MaximumNumber { .. } => "maximum_number",
            Self::SeedSize { .. } => "seed_size",
            Self::FreeSpace { .. } => "free_space",
            Self::RemoteFreeSpace { .. } => "remote_free_space",
            Self::Remove { .. } => "remove",
        }
    }
}

fn from_mapping<T: for<'de> Deserialize<'de>>(key: &str, value: &Value) -> Result<T> {
    serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::invalid(key, e.to_string()))
}

pub(super) fn number(key: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::invalid(key, format!("expected a number, got {value:?}")))
}

fn non_negative(key: &str, value: f64) -> Result<f64> {
    if value < 0.0 {
        Err(ConfigError::invalid(key, "must not be negative"))
    } else {
        Ok(value)
    }
}
