//! Aggregated outcome of a bulk load

use std::collections::HashSet;
use std::hash::Hash;

/// Deduplicated values produced by a load plus the number of items that failed.
///
/// Built once at the end of a load and read-only afterwards. A listing failure
/// before the first page is reported as an empty set with `error_count == 1`.
#[derive(Debug, Clone)]
pub struct MappedResults<R> {
    values: HashSet<R>,
    error_count: usize,
}

impl<R: Eq + Hash> MappedResults<R> {
    pub fn new(values: HashSet<R>, error_count: usize) -> Self {
        Self {
            values,
            error_count,
        }
    }

    /// Result with no values and no errors
    pub fn empty() -> Self {
        Self::new(HashSet::new(), 0)
    }

    /// Union of values, sum of error counts
    pub fn merge(mut self, other: Self) -> Self {
        self.values.extend(other.values);
        self.error_count += other.error_count;
        self
    }

    pub fn values(&self) -> &HashSet<R> {
        &self.values
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> HashSet<R> {
        self.values
    }

    pub fn into_parts(self) -> (HashSet<R>, usize) {
        (self.values, self.error_count)
    }
}

impl<R: Eq + Hash> Default for MappedResults<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Eq + Hash> PartialEq for MappedResults<R> {
    fn eq(&self, other: &Self) -> bool {
        self.error_count == other.error_count && self.values == other.values
    }
}

impl<R: Eq + Hash> Eq for MappedResults<R> {}
