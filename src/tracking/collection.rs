use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use serde::Serialize;

use super::{category::Category, record::TimeRecord};

/// Sums elapsed time of the given records.
pub fn sum_elapsed<'a>(records: impl IntoIterator<Item = &'a TimeRecord>) -> Duration {
    records
        .into_iter()
        .fold(Duration::zero(), |sum, record| sum + record.elapsed())
}

/// Ordered list of records. Order is the order of insertion, which is also the order on screen and
/// in the record file. Duplicates and overlapping intervals are fine.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordCollection {
    records: Vec<TimeRecord>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TimeRecord) {
        self.records.push(record);
    }

    pub fn remove(&mut self, index: usize) -> Option<TimeRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimeRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRecord> {
        self.records.iter()
    }

    /// Every category used by at least one record.
    pub fn categories(&self) -> BTreeSet<Category> {
        self.records
            .iter()
            .filter_map(|record| record.category().cloned())
            .collect()
    }

    pub fn total_elapsed(&self) -> Duration {
        sum_elapsed(&self.records)
    }

    /// Elapsed time of records in one category. [None] selects records without a category, which
    /// is never mixed up with any named category.
    pub fn category_elapsed(&self, category: Option<&Category>) -> Duration {
        sum_elapsed(
            self.records
                .iter()
                .filter(|record| record.category() == category),
        )
    }

    /// Elapsed time of every category present, records without a category included under [None].
    pub fn elapsed_by_category(&self) -> BTreeMap<Option<Category>, Duration> {
        let mut map = BTreeMap::<Option<Category>, Duration>::new();
        for record in &self.records {
            *map.entry(record.category().cloned())
                .or_insert_with(Duration::zero) += record.elapsed();
        }
        map
    }

    /// Elapsed time of the records at `indices`. Indices out of range are ignored, repeated ones
    /// are counted once.
    pub fn selection_elapsed(&self, indices: impl IntoIterator<Item = usize>) -> Duration {
        let indices = indices.into_iter().collect::<BTreeSet<_>>();
        sum_elapsed(indices.into_iter().filter_map(|index| self.records.get(index)))
    }
}

impl FromIterator<TimeRecord> for RecordCollection {
    fn from_iter<T: IntoIterator<Item = TimeRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordCollection {
    type Item = TimeRecord;
    type IntoIter = std::vec::IntoIter<TimeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a TimeRecord;
    type IntoIter = std::slice::Iter<'a, TimeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
