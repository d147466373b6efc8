// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Full-cell matching for live cell-change events.
//!
//! Edits are usually local, so the old and new lists are anchored on their
//! common prefix and common suffix. Whatever is left in the middle is paired
//! purely by position: an edited cell keeps its identity as long as it stays
//! at the same relative offset. Reorderings inside the middle are not
//! detected here (the content-based matcher in [`crate::cell_data`] handles
//! that case for byte-level reloads).
//!
//! Results are reported in two views:
//! - identity: `matched` pairs (prefix, positional middle, suffix), with the
//!   middle leftovers as `deleted` / `inserted`;
//! - content: the middle windows as a whole are `unmatched` / `new_cells`,
//!   since none of those cells survived byte-for-byte.

use crate::ids::StableId;
use crate::model::{cells_equal, Cell, CellContent, CellState};
use std::ops::Range;

/// Index-level result of [`match_indices`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexMatches {
    /// Length of the common prefix.
    pub prefix_len: usize,
    /// Length of the common suffix (disjoint from the prefix).
    pub suffix_len: usize,
    /// Identity pairs `(old_index, new_index)` in document order.
    pub pairs: Vec<(usize, usize)>,
    /// Old indices between the anchors.
    pub old_middle: Range<usize>,
    /// New indices between the anchors.
    pub new_middle: Range<usize>,
}

impl IndexMatches {
    /// Number of positional pairs formed inside the middle windows.
    pub fn middle_paired(&self) -> usize {
        self.old_middle.len().min(self.new_middle.len())
    }

    /// Old middle cells left over after positional pairing.
    pub fn deleted(&self) -> Range<usize> {
        self.old_middle.start + self.middle_paired()..self.old_middle.end
    }

    /// New middle cells left over after positional pairing.
    pub fn inserted(&self) -> Range<usize> {
        self.new_middle.start + self.middle_paired()..self.new_middle.end
    }
}

/// Prefix/suffix anchored, position-first matching over any cell content.
pub fn match_indices<A, B>(removed: &[A], added: &[B]) -> IndexMatches
where
    A: CellContent,
    B: CellContent,
{
    let n = removed.len();
    let m = added.len();

    let mut prefix = 0;
    while prefix < n.min(m) && cells_equal(&removed[prefix], &added[prefix]) {
        prefix += 1;
    }

    let max_suffix = (n - prefix).min(m - prefix);
    let mut suffix = 0;
    while suffix < max_suffix && cells_equal(&removed[n - 1 - suffix], &added[m - 1 - suffix]) {
        suffix += 1;
    }

    let old_middle = prefix..n - suffix;
    let new_middle = prefix..m - suffix;
    let paired = old_middle.len().min(new_middle.len());

    let mut pairs = Vec::with_capacity(prefix + paired + suffix);
    pairs.extend((0..prefix).map(|i| (i, i)));
    pairs.extend((0..paired).map(|k| (old_middle.start + k, new_middle.start + k)));
    pairs.extend((0..suffix).rev().map(|k| (n - 1 - k, m - 1 - k)));

    IndexMatches {
        prefix_len: prefix,
        suffix_len: suffix,
        pairs,
        old_middle,
        new_middle,
    }
}

/// One old cell paired with the new cell that inherits its identity.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    /// Cell from the previous list.
    pub old: &'a Cell,
    /// Cell from the new list.
    pub new: &'a Cell,
}

/// Result of [`match_cells`].
#[derive(Debug, Clone, Default)]
pub struct CellMatches<'a> {
    /// Length of the common prefix.
    pub prefix_len: usize,
    /// Length of the common suffix.
    pub suffix_len: usize,
    /// Identity pairs in document order.
    pub matched: Vec<MatchedPair<'a>>,
    /// Old cells whose content did not survive (the old middle window).
    pub unmatched: Vec<&'a Cell>,
    /// New cells whose content is new (the new middle window).
    pub new_cells: Vec<&'a Cell>,
    /// Old cells with no identity successor.
    pub deleted: Vec<&'a Cell>,
    /// New cells with no identity predecessor.
    pub inserted: Vec<&'a Cell>,
}

impl<'a> CellMatches<'a> {
    /// New cell inheriting the identity of the old cell `old_id`, if any.
    pub fn matched_for(&self, old_id: &StableId) -> Option<&'a Cell> {
        self.matched
            .iter()
            .find(|p| &p.old.id == old_id)
            .map(|p| p.new)
    }
}

/// Match a removed cell list against an added one.
pub fn match_cells<'a>(removed: &'a [Cell], added: &'a [Cell]) -> CellMatches<'a> {
    let idx = match_indices(removed, added);
    CellMatches {
        prefix_len: idx.prefix_len,
        suffix_len: idx.suffix_len,
        matched: idx
            .pairs
            .iter()
            .map(|&(o, n)| MatchedPair {
                old: &removed[o],
                new: &added[n],
            })
            .collect(),
        unmatched: removed[idx.old_middle.clone()].iter().collect(),
        new_cells: added[idx.new_middle.clone()].iter().collect(),
        deleted: removed[idx.deleted()].iter().collect(),
        inserted: added[idx.inserted()].iter().collect(),
    }
}

/// Carry identity and execution state from `old` onto `new`.
///
/// Every identity-matched new cell takes the old cell's id. It also inherits
/// the old outputs and state unless it already carries outputs of its own; a
/// cell whose text changed while inheriting outputs becomes
/// [`CellState::Stale`]. Inserted cells keep their fresh ids.
pub fn reconcile(old: &[Cell], mut new: Vec<Cell>) -> Vec<Cell> {
    let idx = match_indices(old, &new);
    for (o, n) in idx.pairs {
        let prev = &old[o];
        let cell = &mut new[n];
        cell.id = prev.id.clone();
        if cell.outputs.is_empty() && !prev.outputs.is_empty() {
            cell.outputs = prev.outputs.clone();
            cell.state = if cell.value == prev.value {
                prev.state
            } else {
                CellState::Stale
            };
        }
    }
    new
}
