//! Merger-tree linkage and chain resolution.
//!
//! The merger tree stores ids in depth-first order: the main progenitor
//! branch of galaxy `g` is the contiguous id range
//! `g.GalaxyID + 1 ..= g.TopLeafID`, and `g` is the main progenitor of its
//! descendant `d` exactly when `d.GalaxyID + 1 == g.GalaxyID`. Resolving a
//! chain walks that range backwards in time and the descendant pointers
//! forwards in time. Either walk ends early when a link is missing or
//! inconsistent, which is the normal way a tracked object is "lost".

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::config::{SchemaLayout, TrackingConfig};
use crate::error::{DatabaseError, DatabaseResult};
use crate::index::{SnapshotIndex, SortedIndex};
use crate::storage::CatalogueSource;

/// Identity of a tracked object at one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainLink {
    /// Snapshot number.
    pub snapshot: u32,
    /// Position among the subgroups of `snapshot`.
    pub subgroup_number: usize,
    /// Depth-first merger-tree id.
    pub galaxy_id: i64,
    /// Catalogue row.
    pub row: usize,
}

/// Resolved identities of one object, ordered by increasing snapshot.
///
/// Holds at most one link per snapshot and always contains the link the
/// object was tracked from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    links: Vec<ChainLink>,
    origin: usize,
}

impl Chain {
    /// The link tracking started from.
    #[must_use]
    pub fn origin(&self) -> &ChainLink {
        &self.links[self.origin]
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false for chains produced by [`MergerTree::resolve`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// All links, earliest first.
    #[must_use]
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Iterates over the links, earliest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChainLink> {
        self.links.iter()
    }

    /// Snapshot numbers in chain order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<u32> {
        self.links.iter().map(|l| l.snapshot).collect()
    }

    /// Catalogue rows in chain order.
    #[must_use]
    pub fn rows(&self) -> Vec<usize> {
        self.links.iter().map(|l| l.row).collect()
    }

    /// Links before the origin (main progenitors, earliest first).
    #[must_use]
    pub fn progenitors(&self) -> &[ChainLink] {
        &self.links[..self.origin]
    }

    /// Links after the origin (descendants, earliest first).
    #[must_use]
    pub fn descendants(&self) -> &[ChainLink] {
        &self.links[self.origin + 1..]
    }

    /// Link at `snapshot`, if the object was located there.
    #[must_use]
    pub fn at_snapshot(&self, snapshot: u32) -> Option<&ChainLink> {
        self.links
            .binary_search_by_key(&snapshot, |l| l.snapshot)
            .ok()
            .map(|i| &self.links[i])
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a ChainLink;
    type IntoIter = std::slice::Iter<'a, ChainLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

fn read_int_column(
    source: &dyn CatalogueSource,
    path: &str,
    rows: Option<usize>,
) -> DatabaseResult<Vec<i64>> {
    if !source.has_dataset(path) {
        return Err(DatabaseError::schema(format!("required dataset '{path}' is missing")));
    }
    let values = match source.read_column(path)? {
        Column::Int(v) => v,
        other => {
            return Err(DatabaseError::schema(format!(
                "'{path}' must hold integers (found {})",
                other.type_name()
            )))
        }
    };
    if let Some(expected) = rows {
        if values.len() != expected {
            return Err(DatabaseError::schema(format!(
                "'{path}' has {} rows, expected {expected}",
                values.len()
            )));
        }
    }
    Ok(values)
}

fn read_optional_int_column(
    source: &dyn CatalogueSource,
    path: &str,
    rows: usize,
) -> DatabaseResult<Option<Vec<i64>>> {
    if source.has_dataset(path) {
        read_int_column(source, path, Some(rows)).map(Some)
    } else {
        Ok(None)
    }
}

/// Per-row linkage needed to follow subgroups between snapshots.
#[derive(Debug, Clone)]
pub struct MergerTree {
    snapshots: Vec<u32>,
    by_snapshot: SnapshotIndex,
    galaxies: SortedIndex,
    top_leaf: Vec<i64>,
    descendants: Option<Vec<i64>>,
    node_index: Option<Vec<i64>>,
}

impl MergerTree {
    /// Reads the snapshot numbers and tree ids of every catalogue row.
    pub fn load(source: &dyn CatalogueSource, layout: &SchemaLayout) -> DatabaseResult<Self> {
        for group in [&layout.subhalo, &layout.merger_tree] {
            if !source.has_group(group) {
                return Err(DatabaseError::schema(format!("group '{group}' is missing")));
            }
        }

        let snap_path = layout.subhalo_dataset("SnapNum");
        let snapshots = read_int_column(source, &snap_path, None)?
            .into_iter()
            .map(|n| {
                u32::try_from(n).map_err(|_| {
                    DatabaseError::schema(format!("invalid snapshot number {n} in '{snap_path}'"))
                })
            })
            .collect::<DatabaseResult<Vec<u32>>>()?;
        let rows = snapshots.len();

        let galaxy_ids =
            read_int_column(source, &layout.merger_tree_dataset("GalaxyID"), Some(rows))?;
        let top_leaf =
            read_int_column(source, &layout.merger_tree_dataset("TopLeafID"), Some(rows))?;
        let descendants = read_optional_int_column(
            source,
            &layout.merger_tree_dataset("DescendantID"),
            rows,
        )?;
        let node_index =
            read_optional_int_column(source, &layout.merger_tree_dataset("nodeIndex"), rows)?;

        let galaxies = SortedIndex::build(galaxy_ids);
        if galaxies.has_duplicates() {
            return Err(DatabaseError::schema(format!(
                "'{}' contains duplicate ids",
                layout.merger_tree_dataset("GalaxyID")
            )));
        }

        Ok(Self {
            by_snapshot: SnapshotIndex::build(&snapshots),
            snapshots,
            galaxies,
            top_leaf,
            descendants,
            node_index,
        })
    }

    /// Number of catalogue rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if the catalogue has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Rows grouped by snapshot.
    #[must_use]
    pub const fn snapshot_index(&self) -> &SnapshotIndex {
        &self.by_snapshot
    }

    /// Catalogue row of a `(subgroup_number, snapshot)` pair.
    #[must_use]
    pub fn row_of(&self, subgroup_number: usize, snapshot: u32) -> Option<usize> {
        self.by_snapshot.row(snapshot, subgroup_number)
    }

    /// `GalaxyID` of catalogue row `row`.
    #[must_use]
    pub fn galaxy_id(&self, row: usize) -> Option<i64> {
        self.galaxies.id_at(row)
    }

    /// `TopLeafID` of catalogue row `row`.
    #[must_use]
    pub fn top_leaf_id(&self, row: usize) -> Option<i64> {
        self.top_leaf.get(row).copied()
    }

    /// `nodeIndex` of catalogue row `row`, if the catalogue stores it.
    #[must_use]
    pub fn node_index(&self, row: usize) -> Option<i64> {
        self.node_index.as_ref()?.get(row).copied()
    }

    /// `DescendantID` of catalogue row `row`, if the catalogue stores it.
    #[must_use]
    pub fn descendant_id(&self, row: usize) -> Option<i64> {
        self.descendants.as_ref()?.get(row).copied()
    }

    /// Row holding `galaxy_id`.
    #[must_use]
    pub fn row_of_galaxy(&self, galaxy_id: i64) -> Option<usize> {
        self.galaxies.row_of(galaxy_id)
    }

    /// Chain link describing catalogue row `row`.
    #[must_use]
    pub fn link(&self, row: usize) -> Option<ChainLink> {
        let snapshot = *self.snapshots.get(row)?;
        Some(ChainLink {
            snapshot,
            subgroup_number: self.by_snapshot.subgroup_number(snapshot, row)?,
            galaxy_id: self.galaxies.id_at(row)?,
            row,
        })
    }

    /// Resolves the chain through `origin_row`.
    ///
    /// Each walk takes at most `max_hops` steps; passing the number of
    /// snapshots bounds the chain even for corrupt link tables.
    #[must_use]
    pub fn resolve(&self, origin_row: usize, policy: TrackingConfig, max_hops: usize) -> Option<Chain> {
        let origin = self.link(origin_row)?;

        let mut earlier = if policy.direction.follows_progenitors() {
            self.walk_progenitors(origin, max_hops)
        } else {
            Vec::new()
        };
        let later = if policy.direction.follows_descendants() {
            self.walk_descendants(origin, policy.stop_at_mergers, max_hops)
        } else {
            Vec::new()
        };

        earlier.reverse();
        let origin_pos = earlier.len();
        let mut links = earlier;
        links.push(origin);
        links.extend(later);
        Some(Chain {
            links,
            origin: origin_pos,
        })
    }

    /// Main progenitors of `origin`, latest first.
    fn walk_progenitors(&self, origin: ChainLink, max_hops: usize) -> Vec<ChainLink> {
        let Some(top_leaf) = self.top_leaf_id(origin.row) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut current = origin;
        let mut next_id = origin.galaxy_id.saturating_add(1);
        while next_id <= top_leaf && out.len() < max_hops {
            let Some(link) = self.row_of_galaxy(next_id).and_then(|row| self.link(row)) else {
                break;
            };
            if link.snapshot >= current.snapshot {
                break;
            }
            out.push(link);
            current = link;
            next_id = next_id.saturating_add(1);
        }
        out
    }

    /// Descendants of `origin`, earliest first.
    fn walk_descendants(&self, origin: ChainLink, stop_at_mergers: bool, max_hops: usize) -> Vec<ChainLink> {
        let mut out = Vec::new();
        let mut current = origin;
        while out.len() < max_hops {
            let Some(descendant_id) = self.descendant_id(current.row) else {
                break;
            };
            if descendant_id < 0 || descendant_id == current.galaxy_id {
                break;
            }
            let Some(link) = self.row_of_galaxy(descendant_id).and_then(|row| self.link(row)) else {
                break;
            };
            if link.snapshot <= current.snapshot {
                break;
            }
            if stop_at_mergers && link.galaxy_id.saturating_add(1) != current.galaxy_id {
                break;
            }
            out.push(link);
            current = link;
        }
        out
    }
}
