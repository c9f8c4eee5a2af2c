use crate::metrics::DUPLICATES_REMOVED_TOTAL;
use crate::models::LabeledMessage;
use std::collections::HashSet;

/// Exact-row deduplication engine
#[derive(Debug, Clone, Copy, Default)]
pub struct DeduplicationEngine;

impl DeduplicationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Check whether two rows are exact duplicates (every column equal)
    pub fn is_duplicate(&self, a: &LabeledMessage, b: &LabeledMessage) -> bool {
        a == b
    }

    /// Drop exact duplicate rows, keeping the first occurrence and the original order
    pub fn deduplicate(&self, rows: Vec<LabeledMessage>) -> Vec<LabeledMessage> {
        let before = rows.len();
        let mut keep = Vec::with_capacity(before);
        {
            let mut seen: HashSet<&LabeledMessage> = HashSet::with_capacity(before);
            for row in &rows {
                keep.push(seen.insert(row));
            }
        }

        let unique: Vec<LabeledMessage> = rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, first)| first.then_some(row))
            .collect();

        let removed = before - unique.len();
        DUPLICATES_REMOVED_TOTAL.inc_by(removed as u64);
        tracing::info!(before, after = unique.len(), removed, "Duplicate rows removed");
        unique
    }
}
