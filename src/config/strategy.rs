use super::condition::number;
use super::ordered::OrderedEntries;
use super::{ConditionConfig, ConfigError};
use serde::Deserialize;
use serde_yaml::Value;

/// Accept/reject lists of one field filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilterConfig {
    pub all: bool,
    pub accept: Vec<String>,
    pub reject: Vec<String>,
}

impl Default for FieldFilterConfig {
    fn default() -> Self {
        Self {
            all: true,
            accept: Vec::new(),
            reject: Vec::new(),
        }
    }
}

impl FieldFilterConfig {
    /// Accepts every torrent
    pub fn is_pass_through(&self) -> bool {
        self.all && self.reject.is_empty()
    }
}

/// One strategy: filters plus conditions in declaration order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "OrderedEntries<Value>")]
pub struct StrategyConfig {
    pub categories: FieldFilterConfig,
    pub status: FieldFilterConfig,
    pub trackers: FieldFilterConfig,
    pub min_ratio: Option<f64>,
    pub max_ratio: Option<f64>,
    pub conditions: Vec<ConditionConfig>,
}

impl StrategyConfig {
    pub fn condition(&self, key: &str) -> Option<&ConditionConfig> {
        self.conditions.iter().find(|c| c.key() == key)
    }
}

#[derive(Default)]
struct FieldEntries {
    all: Option<bool>,
    accept: Option<Vec<String>>,
    reject: Vec<String>,
}

impl FieldEntries {
    fn finish(self) -> FieldFilterConfig {
        FieldFilterConfig {
            all: self.all.unwrap_or(self.accept.is_none()),
            accept: self.accept.unwrap_or_default(),
            reject: self.reject,
        }
    }
}

impl TryFrom<OrderedEntries<Value>> for StrategyConfig {
    type Error = ConfigError;

    fn try_from(entries: OrderedEntries<Value>) -> Result<Self, Self::Error> {
        let mut categories = FieldEntries::default();
        let mut status = FieldEntries::default();
        let mut trackers = FieldEntries::default();
        let mut config = Self::default();

        for (key, value) in entries.into_inner() {
            match key.as_str() {
                "all_categories" => categories.all = Some(flag(&key, &value)?),
                "categories" => categories.accept = Some(list(&key, &value)?),
                "excluded_categories" => categories.reject = list(&key, &value)?,
                "all_status" => status.all = Some(flag(&key, &value)?),
                "status" => status.accept = Some(list(&key, &value)?),
                "excluded_status" => status.reject = list(&key, &value)?,
                "all_trackers" => trackers.all = Some(flag(&key, &value)?),
                "trackers" => trackers.accept = Some(list(&key, &value)?),
                "excluded_trackers" => trackers.reject = list(&key, &value)?,
                "min_ratio" => config.min_ratio = Some(number(&key, &value)?),
                "max_ratio" => config.max_ratio = Some(number(&key, &value)?),
                _ => match ConditionConfig::from_entry(&key, &value)? {
                    Some(condition) => {
                        if config.condition(condition.key()).is_some() {
                            return Err(ConfigError::invalid(
                                key.as_str(),
                                "condition declared twice",
                            ));
                        }
                        config.conditions.push(condition);
                    }
                    None => tracing::debug!("Ignoring unknown strategy key '{key}'"),
                },
            }
        }

        config.categories = categories.finish();
        config.status = status.finish();
        config.trackers = trackers.finish();
        Ok(config)
    }
}

fn flag(key: &str, value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::invalid(key, "expected true or false"))
}

/// Scalars are wrapped into a one-element list
fn list(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.iter().map(|item| scalar(key, item)).collect(),
        other => Ok(vec![scalar(key, other)?]),
    }
}

fn scalar(key: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ConfigError::invalid(key, "expected a string or a list of strings")),
    }
}
