// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform grid over bounding volumes
//!
//! Used as the cheap spatial pre-filter before a containment predicate runs,
//! so each section form only looks at elements near it.

use rustc_hash::FxHashMap;
use sectioner_model::{Aabb, ElementId};

/// Entries spanning more cells than this are kept in a separate list
const MAX_CELLS_PER_ENTRY: i64 = 512;

type CellKey = (i64, i64, i64);

/// Grid index from cells to the bounding volumes that touch them
#[derive(Clone, Debug, Default)]
pub struct GridIndex {
    cell_size: f64,
    entries: Vec<(ElementId, Aabb)>,
    cells: FxHashMap<CellKey, Vec<u32>>,
    oversized: Vec<u32>,
}

impl GridIndex {
    /// Build an index, picking the cell size from the average entry size
    pub fn build(entries: impl IntoIterator<Item = (ElementId, Aabb)>) -> Self {
        let entries: Vec<(ElementId, Aabb)> = entries.into_iter().collect();
        let cell_size = auto_cell_size(&entries);
        Self::with_cell_size(entries, cell_size)
    }

    /// Build an index with an explicit cell size
    pub fn with_cell_size(entries: Vec<(ElementId, Aabb)>, cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };

        let mut index = Self {
            cell_size,
            entries,
            cells: FxHashMap::default(),
            oversized: Vec::new(),
        };

        for slot in 0..index.entries.len() {
            let bounds = index.entries[slot].1;
            let (lo, hi) = index.cell_range(&bounds);
            if cell_count(lo, hi) > MAX_CELLS_PER_ENTRY {
                index.oversized.push(slot as u32);
                continue;
            }
            for key in cells_in(lo, hi) {
                index.cells.entry(key).or_default().push(slot as u32);
            }
        }

        index
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Ids whose bounding volume intersects `region`, in insertion order, each once
    pub fn query(&self, region: &Aabb) -> Vec<ElementId> {
        let (lo, hi) = self.cell_range(region);

        let mut slots: Vec<u32> = if cell_count(lo, hi) > self.cells.len() as i64 {
            // Region covers more cells than are occupied; walk the occupied ones
            self.cells
                .iter()
                .filter(|(key, _)| in_range(**key, lo, hi))
                .flat_map(|(_, slots)| slots.iter().copied())
                .collect()
        } else {
            cells_in(lo, hi)
                .filter_map(|key| self.cells.get(&key))
                .flat_map(|slots| slots.iter().copied())
                .collect()
        };
        slots.extend_from_slice(&self.oversized);
        slots.sort_unstable();
        slots.dedup();

        slots
            .into_iter()
            .map(|slot| &self.entries[slot as usize])
            .filter(|(_, bounds)| bounds.intersects(region))
            .map(|(id, _)| *id)
            .collect()
    }

    fn cell_range(&self, bounds: &Aabb) -> (CellKey, CellKey) {
        let cell = |v: f64| (v / self.cell_size).floor() as i64;
        (
            (cell(bounds.min[0]), cell(bounds.min[1]), cell(bounds.min[2])),
            (cell(bounds.max[0]), cell(bounds.max[1]), cell(bounds.max[2])),
        )
    }
}

fn auto_cell_size(entries: &[(ElementId, Aabb)]) -> f64 {
    if entries.is_empty() {
        return 1.0;
    }
    let total: f64 = entries
        .iter()
        .map(|(_, b)| {
            let [x, y, z] = b.extent();
            x.max(y).max(z)
        })
        .filter(|v| v.is_finite())
        .sum();
    let mean = total / entries.len() as f64;
    if mean > 0.0 {
        mean * 2.0
    } else {
        1.0
    }
}

fn cell_count(lo: CellKey, hi: CellKey) -> i64 {
    let span = |a: i64, b: i64| b.saturating_sub(a).saturating_add(1).max(0);
    span(lo.0, hi.0)
        .saturating_mul(span(lo.1, hi.1))
        .saturating_mul(span(lo.2, hi.2))
}

fn in_range(key: CellKey, lo: CellKey, hi: CellKey) -> bool {
    (lo.0..=hi.0).contains(&key.0)
        && (lo.1..=hi.1).contains(&key.1)
        && (lo.2..=hi.2).contains(&key.2)
}

fn cells_in(lo: CellKey, hi: CellKey) -> impl Iterator<Item = CellKey> {
    (lo.0..=hi.0).flat_map(move |x| {
        (lo.1..=hi.1).flat_map(move |y| (lo.2..=hi.2).map(move |z| (x, y, z)))
    })
}
