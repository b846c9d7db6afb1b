//! Deduplicating record storage: an ordered set for membership, a list for emission order.

use std::collections::BTreeSet;

use super::record::ValidationRecord;

#[derive(Default)]
pub struct RecordStore {
    ordered: BTreeSet<ValidationRecord>,
    list: Vec<ValidationRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn record_exists(&self, record: &ValidationRecord) -> bool {
        self.ordered.contains(record)
    }

    /// Appends `record` unless an equal one is already stored. Returns whether it was added.
    pub fn insert(&mut self, record: ValidationRecord) -> bool {
        if !self.ordered.insert(record.clone()) {
            return false;
        }
        self.list.push(record);
        true
    }

    /// Records in the order they were first added.
    pub fn records(&self) -> &[ValidationRecord] {
        &self.list
    }
}
