//! Bounded, deduplicated history of received dives.
//!
//! Deliveries are at-least-once and unordered, and a repeated delivery can be
//! more or less complete than the copy already held. Inserting therefore
//! replaces by id rather than ignoring duplicates; the newest write wins.

use std::collections::HashSet;

use log::debug;

use crate::models::{DiveSummary, SummaryId};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Display order for a history listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, uniffi::Enum)]
pub enum SortMode {
    #[default]
    EndDateDescending,
    EndDateAscending,
    LocationAscending,
    LocationDescending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Replaced,
}

/// Most recent dives by end date, at most `capacity` of them.
#[derive(Clone, Debug)]
pub struct HistoryReconciler {
    entries: Vec<DiveSummary>,
    capacity: usize,
}

impl HistoryReconciler {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild from a persisted history, applying the same merge rules as
    /// [`HistoryReconciler::insert`].
    pub fn from_entries(entries: Vec<DiveSummary>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for summary in entries {
            history.insert(summary);
        }
        history
    }

    /// Merge one summary: replace the entry with the same id, or append.
    /// The history is then re-sorted newest first and cut to capacity.
    pub fn insert(&mut self, summary: DiveSummary) -> InsertOutcome {
        let outcome = match self.entries.iter().position(|s| s.id == summary.id) {
            Some(index) => {
                self.entries[index] = summary;
                InsertOutcome::Replaced
            }
            None => {
                self.entries.push(summary);
                InsertOutcome::Inserted
            }
        };

        self.entries.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        if self.entries.len() > self.capacity {
            for evicted in self.entries.drain(self.capacity..) {
                debug!("evicting dive {} ended {}", evicted.id, evicted.end_date);
            }
        }
        outcome
    }

    /// Read-modify-write of one entry. Returns the stored result, or `None`
    /// when the id is not (or no longer) in the history. The id is kept even
    /// if `update` changes it.
    pub fn update<F>(&mut self, id: &SummaryId, update: F) -> Option<DiveSummary>
    where
        F: FnOnce(DiveSummary) -> DiveSummary,
    {
        let current = self.get(id)?.clone();
        let mut updated = update(current);
        updated.id = id.clone();
        self.insert(updated);
        self.get(id).cloned()
    }

    pub fn get(&self, id: &SummaryId) -> Option<&DiveSummary> {
        self.entries.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SummaryId) -> bool {
        self.get(id).is_some()
    }

    /// Entries newest first.
    pub fn entries(&self) -> &[DiveSummary] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DiveSummary> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sorted(&self, mode: SortMode) -> Vec<DiveSummary> {
        deduped_sorted(&self.entries, mode)
    }
}

impl Default for HistoryReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// One summary per id (the first encountered), ordered by `mode`.
/// Location ordering compares labels case-insensitively.
pub fn deduped_sorted(history: &[DiveSummary], mode: SortMode) -> Vec<DiveSummary> {
    let mut seen = HashSet::new();
    let mut dives: Vec<DiveSummary> = history
        .iter()
        .filter(|s| seen.insert(s.id.clone()))
        .cloned()
        .collect();

    match mode {
        SortMode::EndDateDescending => dives.sort_by(|a, b| b.end_date.cmp(&a.end_date)),
        SortMode::EndDateAscending => dives.sort_by(|a, b| a.end_date.cmp(&b.end_date)),
        SortMode::LocationAscending => {
            dives.sort_by_cached_key(|s| s.location_label().to_lowercase())
        }
        SortMode::LocationDescending => {
            dives.sort_by_cached_key(|s| std::cmp::Reverse(s.location_label().to_lowercase()))
        }
    }
    dives
}
