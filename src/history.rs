//! Append-only audit ledger attached to every request
use super::request::{EventStamp, RequestDate, Stage, Status};

/// One immutable audit record. Never mutated after creation.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    #[n(0)]
    pub label: String,
    #[n(1)]
    pub status: Status, // the status transitioned into
    #[n(2)]
    pub date: RequestDate,
    #[n(3)]
    pub time: String,
    #[n(4)]
    pub timestamp_millis: i64, // canonical sort key
    #[n(5)]
    pub actor: String,
    #[n(6)]
    pub reason: Option<String>,
}

impl HistoryEvent {
    pub fn new(label: &str, status: Status, stamp: EventStamp, actor: &str) -> Self {
        Self {
            label: label.to_string(),
            status,
            date: stamp.date(),
            time: stamp.time(),
            timestamp_millis: stamp.millis(),
            actor: actor.to_string(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn is_rejection(&self) -> bool {
        self.status == Status::Rejected || self.label.to_lowercase().contains("reject")
    }
}

/// History sorted most-recent-first by `timestamp_millis`; ties keep
/// original insertion order.
pub fn ordered_by_recency(history: &[HistoryEvent]) -> Vec<HistoryEvent> {
    let mut ordered = history.to_vec();
    ordered.sort_by_key(|event| std::cmp::Reverse(event.timestamp_millis));
    ordered
}

/// Which stage a rejection is attributed to, derived from the first
/// rejection event in insertion order. Liaison is the default when the
/// label names no other stage.
pub fn rejection_stage(history: &[HistoryEvent]) -> Stage {
    for event in history {
        if !event.is_rejection() {
            continue;
        }
        let label = event.label.to_lowercase();
        if label.contains("management") {
            return Stage::Management;
        }
        if label.contains("cashier") || label.contains("responsible") {
            return Stage::Cashier;
        }
        return Stage::Liaison;
    }
    Stage::Liaison
}
