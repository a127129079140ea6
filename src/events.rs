//! Progress of a strategy evaluation, reported as events
//!
//! The evaluation core only emits events; what happens to them (log lines,
//! nothing at all, a test recorder) is up to the sink.

use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationEvent {
    StrategyStarted {
        strategy: String,
        total: usize,
    },
    FilterApplied {
        strategy: String,
        filter: String,
        before: usize,
        after: usize,
    },
    FilterSkipped {
        strategy: String,
        filter: String,
    },
    ConditionApplied {
        strategy: String,
        condition: String,
        before: usize,
        remained: usize,
        removed: usize,
    },
    StrategyFinished {
        strategy: String,
        remain: usize,
        remove: usize,
    },
}

pub trait EventSink {
    fn emit(&self, event: &EvaluationEvent);
}

/// Writes every event to the `tracing` log
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &EvaluationEvent) {
        match event {
            EvaluationEvent::StrategyStarted { strategy, total } => {
                tracing::info!("Running strategy {strategy} on {total} torrent(s)...");
            }
            EvaluationEvent::FilterApplied {
                strategy,
                filter,
                before,
                after,
            } => {
                tracing::debug!(
                    strategy = %strategy,
                    filter = %filter,
                    "Filter applied: {before} -> {after} torrent(s)"
                );
            }
            EvaluationEvent::FilterSkipped { strategy, filter } => {
                tracing::debug!(
                    strategy = %strategy,
                    filter = %filter,
                    "Filter skipped, not configured"
                );
            }
            EvaluationEvent::ConditionApplied {
                strategy,
                condition,
                before,
                remained,
                removed,
            } => {
                tracing::debug!(
                    strategy = %strategy,
                    condition = %condition,
                    "Condition applied: {before} torrent(s) in, {remained} remain, {removed} to remove"
                );
            }
            EvaluationEvent::StrategyFinished {
                strategy,
                remain,
                remove,
            } => {
                tracing::info!(
                    "Strategy {strategy}: total {} torrent(s), {remove} torrent(s) can be removed",
                    remain + remove
                );
            }
        }
    }
}

/// Discards every event
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &EvaluationEvent) {}
}

/// Keeps events in memory, in emission order
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EvaluationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EvaluationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &EvaluationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
