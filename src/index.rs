//! Lookup indices over catalogue columns.
//!
//! Catalogue rows are not sorted by id, so lookups go through an argsort
//! ("sorter array") and a binary search over it.

use std::collections::BTreeMap;

/// Positions of `targets` inside `values`, searched through `sorter`.
///
/// `sorter` must order `values` ascending (an argsort). Targets that do
/// not occur are skipped; for duplicated values the first row in sorted
/// order is returned.
#[must_use]
pub fn quick_search(values: &[i64], sorter: &[usize], targets: &[i64]) -> Vec<usize> {
    targets
        .iter()
        .filter_map(|&t| {
            let pos = sorter.partition_point(|&row| values[row] < t);
            sorter.get(pos).copied().filter(|&row| values[row] == t)
        })
        .collect()
}

/// Argsort of an id column, answering "which row holds id X".
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
    ids: Vec<i64>,
    sorter: Vec<usize>,
}

impl SortedIndex {
    /// Builds the index over `ids`, taking ownership of the column.
    #[must_use]
    pub fn build(ids: Vec<i64>) -> Self {
        let mut sorter: Vec<usize> = (0..ids.len()).collect();
        sorter.sort_by_key(|&row| ids[row]);
        Self { ids, sorter }
    }

    /// Row holding `id`.
    #[must_use]
    pub fn row_of(&self, id: i64) -> Option<usize> {
        quick_search(&self.ids, &self.sorter, &[id]).first().copied()
    }

    /// Rows holding each of `ids`, skipping ids that are absent.
    #[must_use]
    pub fn rows_of(&self, ids: &[i64]) -> Vec<usize> {
        quick_search(&self.ids, &self.sorter, ids)
    }

    /// Id stored at `row`.
    #[must_use]
    pub fn id_at(&self, row: usize) -> Option<i64> {
        self.ids.get(row).copied()
    }

    /// Returns true if some id appears more than once.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.sorter
            .windows(2)
            .any(|w| self.ids[w[0]] == self.ids[w[1]])
    }

    /// Number of indexed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no ids are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Rows of each snapshot, in catalogue order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotIndex {
    rows: BTreeMap<u32, Vec<usize>>,
}

impl SnapshotIndex {
    /// Groups catalogue rows by their snapshot number.
    #[must_use]
    pub fn build(snapshots: &[u32]) -> Self {
        let mut rows: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (row, &snap) in snapshots.iter().enumerate() {
            rows.entry(snap).or_default().push(row);
        }
        Self { rows }
    }

    /// Catalogue row of the `subgroup_number`-th subgroup of `snapshot`.
    #[must_use]
    pub fn row(&self, snapshot: u32, subgroup_number: usize) -> Option<usize> {
        self.rows.get(&snapshot)?.get(subgroup_number).copied()
    }

    /// Position of `row` among the rows of `snapshot`.
    #[must_use]
    pub fn subgroup_number(&self, snapshot: u32, row: usize) -> Option<usize> {
        self.rows.get(&snapshot)?.binary_search(&row).ok()
    }

    /// Number of subgroups in `snapshot`.
    #[must_use]
    pub fn count(&self, snapshot: u32) -> usize {
        self.rows.get(&snapshot).map_or(0, Vec::len)
    }

    /// Snapshot numbers that have at least one subgroup.
    pub fn snapshots(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }
}
