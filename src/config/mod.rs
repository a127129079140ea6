mod condition;
mod error;
mod ordered;
mod strategy;
mod task;

pub use condition::ConditionConfig;
pub use error::{ConfigError, Result};
pub use ordered::OrderedEntries;
pub use strategy::{FieldFilterConfig, StrategyConfig};
pub use task::{ClientKind, TaskConfig};

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration: task name → task, in file order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "OrderedEntries<TaskConfig>")]
pub struct AppConfig {
    pub tasks: Vec<(String, TaskConfig)>,
}

impl From<OrderedEntries<TaskConfig>> for AppConfig {
    fn from(entries: OrderedEntries<TaskConfig>) -> Self {
        Self {
            tasks: entries.into_inner(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        for (_, task) in &mut config.tasks {
            task.substitute_env();
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without environment substitution or validation
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Checks that there is something to run and every strategy can be built
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }

        for (task_name, task) in &self.tasks {
            if task.strategies.is_empty() {
                tracing::warn!("Task '{task_name}' has no strategies");
            }
            for (name, strategy) in &task.strategies {
                crate::factory::build_strategy(name, strategy)?;
            }
        }

        Ok(())
    }

    pub fn task(&self, name: &str) -> Result<&TaskConfig> {
        self.entry(name).map(|(_, task)| task)
    }

    /// Task name as stored in the configuration, paired with its settings
    fn entry(&self, name: &str) -> Result<(&str, &TaskConfig)> {
        self.tasks
            .iter()
            .find(|(task_name, _)| task_name == name)
            .map(|(task_name, task)| (task_name.as_str(), task))
            .ok_or_else(|| ConfigError::UnknownTask {
                name: name.to_string(),
            })
    }

    /// Tasks to run: the named ones in the given order, or all of them
    pub fn select(&self, names: &[String]) -> Result<Vec<(&str, &TaskConfig)>> {
        if names.is_empty() {
            return Ok(self
                .tasks
                .iter()
                .map(|(name, task)| (name.as_str(), task))
                .collect());
        }
        names
            .iter()
            .map(|name| self.entry(name))
            .collect()
    }
}
