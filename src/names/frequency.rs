// Name frequency counting.
//
// Duplicates are the signal here: a variant that shows up on many pages is
// more likely to be how the person is actually referred to.

use std::collections::HashMap;

/// Occurrence count per distinct name, built once per batch.
///
/// Counts are exact and case-sensitive. The first-seen order of distinct
/// names is kept only to break ties in `top_n`.
#[derive(Debug, Clone, Default)]
pub struct NameFrequencyTable {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

/// Count every name in `names`.
pub fn count<S: AsRef<str>>(names: &[S]) -> NameFrequencyTable {
    let mut table = NameFrequencyTable::default();
    for name in names {
        let name = name.as_ref();
        match table.counts.get_mut(name) {
            Some(n) => *n += 1,
            None => {
                table.counts.insert(name.to_string(), 1);
                table.order.push(name.to_string());
            }
        }
    }
    table
}

impl NameFrequencyTable {
    /// How many times `name` occurred (0 if never).
    pub fn get(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of occurrences counted.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// The count map itself. Independent of the input order.
    pub fn as_map(&self) -> &HashMap<String, usize> {
        &self.counts
    }

    /// Distinct names with counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.counts[name.as_str()]))
    }

    /// The `n` most frequent names, highest count first.
    ///
    /// The sort is stable over first-seen order, so ties go to the name that
    /// appeared earlier in the batch.
    pub fn top_n(&self, n: usize) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}
