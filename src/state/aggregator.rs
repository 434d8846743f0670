use crate::movie::MovieRecord;
use std::collections::HashSet;

/// Deduplicating, order-preserving record accumulator
///
/// Records are kept in insertion order and keyed by `id`. Once `target_count`
/// records are held, further records are dropped.
///
/// Only the pipeline orchestrator feeds the aggregator, so it takes `&mut
/// self` and does no locking of its own.
#[derive(Debug)]
pub struct Aggregator {
    target_count: usize,
    seen: HashSet<u64>,
    records: Vec<MovieRecord>,
    duplicates: usize,
}

impl Aggregator {
    /// Creates an aggregator that fills up at `target_count` records
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            seen: HashSet::with_capacity(target_count),
            records: Vec::with_capacity(target_count),
            duplicates: 0,
        }
    }

    /// Adds a record
    ///
    /// # Returns
    ///
    /// * `true` - The record was inserted
    /// * `false` - Its id was already present, or the aggregator is full
    pub fn add(&mut self, record: MovieRecord) -> bool {
        if self.is_full() {
            return false;
        }

        if !self.seen.insert(record.id) {
            tracing::debug!("Dropping duplicate movie id {}", record.id);
            self.duplicates += 1;
            return false;
        }

        self.records.push(record);
        true
    }

    /// Returns true once `target_count` records are held
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.target_count
    }

    /// Number of records still wanted
    pub fn remaining(&self) -> usize {
        self.target_count.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records rejected because their id was already present
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// The records collected so far, in insertion order
    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    /// Consumes the aggregator, returning the records in insertion order
    pub fn into_records(self) -> Vec<MovieRecord> {
        self.records
    }
}
