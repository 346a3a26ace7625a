use std::collections::HashSet;

use itertools::Itertools;

use crate::format::{ellipsify, DEFAULT_ELLIPSIS_LEN};
use crate::models::{ActivityRecord, DeliveredEvent, EventKind};

/// Merged history of `Increased` and `Reset` events, most recent first.
///
/// Records are keyed by block hash. A hash seen once keeps its first record
/// for the lifetime of the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFeed {
    records: Vec<ActivityRecord>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Folds freshly delivered batches into the feed and returns the records
    /// that were not present before.
    pub fn merge(
        &mut self,
        increases: &[DeliveredEvent],
        resets: &[DeliveredEvent],
    ) -> Vec<ActivityRecord> {
        let previous = std::mem::take(&mut self.records);
        let known: HashSet<String> = previous.iter().map(|record| record.hash.clone()).collect();

        self.records = merge(previous, increases, resets);
        self.records
            .iter()
            .filter(|record| !known.contains(&record.hash))
            .cloned()
            .collect()
    }

    pub fn render(&self) -> Vec<String> {
        if self.records.is_empty() {
            return vec!["No activity yet".to_string()];
        }
        self.records.iter().map(render_record).collect()
    }
}

pub fn render_record(record: &ActivityRecord) -> String {
    format!(
        "{} {}",
        ellipsify(&record.account, DEFAULT_ELLIPSIS_LEN),
        record.name
    )
}

/// Unions `previous` with both batches by hash (first occurrence wins) and
/// sorts the result by timestamp, newest first.
pub fn merge(
    previous: Vec<ActivityRecord>,
    increases: &[DeliveredEvent],
    resets: &[DeliveredEvent],
) -> Vec<ActivityRecord> {
    let increases = increases
        .iter()
        .map(|event| ActivityRecord::from_delivered(EventKind::Increased, event));
    let resets = resets
        .iter()
        .map(|event| ActivityRecord::from_delivered(EventKind::Reset, event));

    let mut records: Vec<ActivityRecord> = previous
        .into_iter()
        .chain(increases)
        .chain(resets)
        .unique_by(|record| record.hash.clone())
        .collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}
