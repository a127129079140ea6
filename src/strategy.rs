use crate::error::EvaluationError;
use crate::events::{EvaluationEvent, EventSink, TracingSink};
use crate::filters::Filter;
use crate::{ClientStatus, Condition, TorrentSet};
use std::fmt;

/// A named rule set: filters narrow the torrents, conditions pick which to remove
///
/// Filters run first in the order they were added, then conditions in
/// declaration order. Each condition only sees what earlier conditions left
/// in `remain_list`; its removals are added to `remove_list`.
pub struct Strategy {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    conditions: Vec<Box<dyn Condition>>,
    remain_list: TorrentSet,
    remove_list: TorrentSet,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("filters", &self.filter_names())
            .field("conditions", &self.condition_names())
            .field("remain", &self.remain_list.len())
            .field("remove", &self.remove_list.len())
            .finish()
    }
}

impl Strategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            conditions: Vec::new(),
            remain_list: TorrentSet::new(),
            remove_list: TorrentSet::new(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn add_condition(mut self, condition: Box<dyn Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn condition_names(&self) -> Vec<&str> {
        self.conditions.iter().map(|c| c.name()).collect()
    }

    pub const fn remain_list(&self) -> &TorrentSet {
        &self.remain_list
    }

    pub const fn remove_list(&self) -> &TorrentSet {
        &self.remove_list
    }

    /// Runs the strategy, logging progress through `tracing`
    pub fn execute(
        &mut self,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<(), EvaluationError> {
        self.execute_with(status, torrents, &TracingSink)
    }

    /// Runs the strategy. On error both lists are left empty.
    pub fn execute_with(
        &mut self,
        status: &ClientStatus,
        torrents: &TorrentSet,
        sink: &dyn EventSink,
    ) -> Result<(), EvaluationError> {
        self.remain_list = torrents.clone();
        self.remove_list = TorrentSet::new();

        let result = self.evaluate(status, sink);
        if result.is_err() {
            self.remain_list.clear();
            self.remove_list.clear();
        }
        result
    }

    fn evaluate(
        &mut self,
        status: &ClientStatus,
        sink: &dyn EventSink,
    ) -> Result<(), EvaluationError> {
        sink.emit(&EvaluationEvent::StrategyStarted {
            strategy: self.name.clone(),
            total: self.remain_list.len(),
        });

        for filter in &self.filters {
            if filter.is_pass_through() {
                sink.emit(&EvaluationEvent::FilterSkipped {
                    strategy: self.name.clone(),
                    filter: filter.name().to_string(),
                });
                continue;
            }
            let before = self.remain_list.len();
            self.remain_list = filter.apply(std::mem::take(&mut self.remain_list));
            sink.emit(&EvaluationEvent::FilterApplied {
                strategy: self.name.clone(),
                filter: filter.name().to_string(),
                before,
                after: self.remain_list.len(),
            });
        }

        for condition in &self.conditions {
            let before = self.remain_list.len();
            let partition = condition.apply(status, &self.remain_list)?;
            sink.emit(&EvaluationEvent::ConditionApplied {
                strategy: self.name.clone(),
                condition: condition.name().to_string(),
                before,
                remained: partition.remain.len(),
                removed: partition.remove.len(),
            });
            self.remain_list = partition.remain;
            self.remove_list.extend(partition.remove);
        }

        sink.emit(&EvaluationEvent::StrategyFinished {
            strategy: self.name.clone(),
            remain: self.remain_list.len(),
            remove: self.remove_list.len(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::test_support::{hashes, set};
    use crate::conditions::{NothingCondition, ThresholdCondition, ThresholdKind};
    use crate::events::{NoopSink, RecordingSink};
    use crate::factory::build_strategy;
    use crate::filters::{FieldFilter, RatioFilter};
    use crate::{StrategyConfig, Torrent};

    fn torrents() -> TorrentSet {
        set(vec![
            Torrent {
                ratio: 0.5,
                seeding_time: 100_000,
                category: vec!["movies".to_string()],
                ..Torrent::new("a", "low ratio, long seed")
            },
            Torrent {
                ratio: 1.5,
                seeding_time: 10,
                category: vec!["movies".to_string()],
                ..Torrent::new("b", "high ratio, fresh")
            },
            Torrent {
                ratio: -1.0,
                seeding_time: 86_400,
                category: vec!["tv".to_string()],
                ..Torrent::new("c", "infinite ratio")
            },
            Torrent {
                ratio: 1.0,
                seeding_time: 86_399,
                ..Torrent::new("d", "ratio exactly one")
            },
        ])
    }

    fn from_yaml(yaml: &str) -> Strategy {
        let config: StrategyConfig = serde_yaml::from_str(yaml).unwrap();
        build_strategy("test", &config).unwrap()
    }

    fn assert_disjoint(strategy: &Strategy) {
        assert!(strategy.remain_list().is_disjoint(strategy.remove_list()));
    }

    #[test]
    fn test_new_strategy() {
        let strategy = Strategy::new("test");
        assert_eq!(strategy.name(), "test");
        assert!(strategy.filter_names().is_empty());
        assert!(strategy.condition_names().is_empty());
        assert!(strategy.remain_list().is_empty());
        assert!(strategy.remove_list().is_empty());
    }

    #[test]
    fn test_no_conditions_removes_nothing() {
        let mut strategy = Strategy::new("empty");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(strategy.remain_list().len(), 4);
        assert!(strategy.remove_list().is_empty());
    }

    #[test]
    fn test_min_ratio_scenario() {
        // min_ratio 1.0 оставляет b, c (бесконечный ratio) и d; nothing ничего не удаляет
        let mut strategy = from_yaml("min_ratio: 1.0\nnothing: ~");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(strategy.remain_list()), vec!["b", "c", "d"]);
        assert!(strategy.remove_list().is_empty());
    }

    #[test]
    fn test_seeding_time_scenario() {
        let mut strategy = from_yaml("seeding_time: 86400");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(strategy.remove_list()), vec!["a", "c"]);
        assert_eq!(hashes(strategy.remain_list()), vec!["b", "d"]);
        assert_disjoint(&strategy);
    }

    #[test]
    fn test_filtered_out_torrents_are_in_neither_list() {
        let mut strategy = from_yaml("categories: movies\nseeding_time: 86400");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(strategy.remove_list()), vec!["a"]);
        assert_eq!(hashes(strategy.remain_list()), vec!["b"]);
    }

    #[test]
    fn test_later_conditions_see_remaining_only() {
        // ratio >= 1 забирает b, c, d; maximum_number видит только a
        let mut strategy = from_yaml("ratio: 1\nmaximum_number: 0");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(hashes(strategy.remove_list()), vec!["a", "b", "c", "d"]);
        assert!(strategy.remain_list().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let yaml = "ratio: 1\nmaximum_number: 1\nseeding_time: 50";
        let mut first = from_yaml(yaml);
        let mut second = from_yaml(yaml);
        first.execute(&ClientStatus::new(0), &torrents()).unwrap();
        second.execute(&ClientStatus::new(0), &torrents()).unwrap();
        assert_eq!(first.remove_list(), second.remove_list());
        assert_eq!(first.remain_list(), second.remain_list());
    }

    #[test]
    fn test_unsupported_property_clears_lists() {
        let mut strategy = Strategy::new("s")
            .add_condition(Box::new(NothingCondition))
            .add_condition(Box::new(ThresholdCondition::new(ThresholdKind::MaxSeeder, 5.0)));
        let err = strategy
            .execute(&ClientStatus::new(0), &torrents())
            .unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::UnsupportedProperty { property: "seeder", ref condition }
                if condition == "max_seeder"
        ));
        assert!(strategy.remain_list().is_empty());
        assert!(strategy.remove_list().is_empty());
    }

    #[test]
    fn test_rerun_resets_lists() {
        let mut strategy = from_yaml("seeding_time: 86400");
        strategy.execute(&ClientStatus::new(0), &torrents()).unwrap();
        let single = set(vec![Torrent::new("z", "z")]);
        strategy.execute(&ClientStatus::new(0), &single).unwrap();
        assert_eq!(hashes(strategy.remain_list()), vec!["z"]);
        assert!(strategy.remove_list().is_empty());
    }

    #[test]
    fn test_events() {
        let mut strategy = Strategy::new("events")
            .add_filter(Box::new(FieldFilter::category(true, vec![], vec![])))
            .add_filter(Box::new(RatioFilter::new(Some(1.0), None)))
            .add_condition(Box::new(ThresholdCondition::new(
                ThresholdKind::SeedingTime,
                86_400.0,
            )));
        let sink = RecordingSink::new();
        strategy
            .execute_with(&ClientStatus::new(0), &torrents(), &sink)
            .unwrap();

        assert_eq!(
            sink.events(),
            vec![
                EvaluationEvent::StrategyStarted {
                    strategy: "events".to_string(),
                    total: 4
                },
                EvaluationEvent::FilterSkipped {
                    strategy: "events".to_string(),
                    filter: "category".to_string()
                },
                EvaluationEvent::FilterApplied {
                    strategy: "events".to_string(),
                    filter: "ratio".to_string(),
                    before: 4,
                    after: 3
                },
                EvaluationEvent::ConditionApplied {
                    strategy: "events".to_string(),
                    condition: "seeding_time".to_string(),
                    before: 3,
                    remained: 2,
                    removed: 1
                },
                EvaluationEvent::StrategyFinished {
                    strategy: "events".to_string(),
                    remain: 2,
                    remove: 1
                },
            ]
        );
    }

    #[test]
    fn test_debug_lists_stages() {
        let mut strategy = from_yaml("seeding_time: 86400");
        strategy.execute_with(&ClientStatus::new(0), &torrents(), &NoopSink).unwrap();
        let debug = format!("{strategy:?}");
        assert!(debug.contains("name: \"test\""));
        assert!(debug.contains("\"seeding_time\""));
        assert!(debug.contains("remove: 2"));
    }
}
