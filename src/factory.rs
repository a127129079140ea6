use crate::conditions::{
    ConditionParser, FreeSpaceCondition, FreeSpaceSource, NothingCondition, SeedSizeCondition,
    ThresholdCondition, TorrentNumberCondition,
};
use crate::config::{ConditionConfig, ConfigError, FieldFilterConfig, StrategyConfig};
use crate::filters::{FieldFilter, FilterField, RatioFilter};
use crate::{Condition, Strategy};

pub fn build_strategy(name: &str, config: &StrategyConfig) -> Result<Strategy, ConfigError> {
    let mut strategy = Strategy::new(name);

    for (field, filter) in [
        (FilterField::Category, &config.categories),
        (FilterField::Status, &config.status),
        (FilterField::Tracker, &config.trackers),
    ] {
        strategy = strategy.add_filter(Box::new(build_field_filter(field, filter)));
    }

    if config.min_ratio.is_some() || config.max_ratio.is_some() {
        strategy = strategy.add_filter(Box::new(RatioFilter::new(
            config.min_ratio,
            config.max_ratio,
        )));
    }

    for condition in &config.conditions {
        strategy = strategy.add_condition(build_condition(condition, name, config)?);
    }

    Ok(strategy)
}

fn build_field_filter(field: FilterField, config: &FieldFilterConfig) -> FieldFilter {
    FieldFilter::new(
        field,
        config.all,
        config.accept.clone(),
        config.reject.clone(),
    )
}

/// Builds one condition. `siblings` resolves the keys a `remove` expression refers to.
pub fn build_condition(
    config: &ConditionConfig,
    strategy: &str,
    siblings: &StrategyConfig,
) -> Result<Box<dyn Condition>, ConfigError> {
    let condition: Box<dyn Condition> = match config {
        ConditionConfig::Nothing => Box::new(NothingCondition),
        ConditionConfig::Threshold { kind, value } => {
            Box::new(ThresholdCondition::new(*kind, *value))
        }
        ConditionConfig::MaximumNumber { limit, action } => {
            Box::new(TorrentNumberCondition::new(*limit, *action))
        }
        ConditionConfig::SeedSize { limit_gib, action } => {
            Box::new(SeedSizeCondition::new(*limit_gib, *action))
        }
        ConditionConfig::FreeSpace {
            min_gib,
            path,
            action,
        } => Box::new(FreeSpaceCondition::new(
            FreeSpaceSource::Local(path.clone()),
            *min_gib,
            *action,
        )),
        ConditionConfig::RemoteFreeSpace { min_gib, action } => Box::new(
            FreeSpaceCondition::new(FreeSpaceSource::Remote, *min_gib, *action),
        ),
        ConditionConfig::Remove { expression } => {
            let parser = ConditionParser::build(expression.clone(), |reference| {
                let unknown = || ConfigError::UnknownConditionReference {
                    strategy: strategy.to_string(),
                    reference: reference.to_string(),
                };
                if reference == config.key() {
                    return Err(unknown());
                }
                let referenced = siblings.condition(reference).ok_or_else(unknown)?;
                build_condition(referenced, strategy, siblings)
            })?;
            Box::new(parser)
        }
    };

    Ok(condition)
}
