use std::collections::HashSet;
use tracing::debug;

use crate::types::{CollectionResult, Record};

/// Append-only record accumulator for one run, unique by identifier.
///
/// The first occurrence of an identifier is kept; later ones are dropped and
/// counted. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct DeduplicatingCollector {
    records: Vec<Record>,
    seen: HashSet<String>,
    duplicates: usize,
    pages_visited: u32,
    cards_skipped: usize,
}

impl DeduplicatingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the identifier was already collected.
    pub fn add(&mut self, record: Record) -> bool {
        if self.seen.contains(record.identifier()) {
            debug!("Duplicate listing dropped: {}", record.identifier());
            self.duplicates += 1;
            return false;
        }
        self.seen.insert(record.identifier().to_string());
        self.records.push(record);
        true
    }

    /// Count a harvested page and the cards it skipped
    pub fn record_page(&mut self, cards_skipped: usize) {
        self.pages_visited += 1;
        self.cards_skipped += cards_skipped;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    pub fn finalize(self) -> CollectionResult {
        CollectionResult {
            records: self.records,
            pages_visited: self.pages_visited,
            cards_skipped: self.cards_skipped,
            duplicates_removed: self.duplicates,
        }
    }
}
