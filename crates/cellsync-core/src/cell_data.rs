// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content-based matching for byte-level reloads.
//!
//! When a document is re-parsed from raw bytes there is no live diff to lean
//! on, only a cached cell list from an earlier serialize. Position is a weak
//! signal at that boundary, so the middle window is matched by content
//! first: byte-identical cells, then cells equal after whitespace
//! normalization. Anything still unmatched inherits nothing.

use crate::model::{cells_equal, Cell, CellContent};
use std::collections::BTreeMap;

/// Result of [`match_cell_data`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellDataMatch {
    /// Length of the byte-identical prefix.
    pub stable_prefix: usize,
    /// Length of the byte-identical suffix (disjoint from the prefix).
    pub stable_suffix: usize,
    /// Middle-window pairs, cached index to incoming index.
    pub middle_matches: BTreeMap<usize, usize>,
}

impl CellDataMatch {
    /// Map an incoming index back to the cached index it inherits from.
    ///
    /// Checks the prefix, then the trailing suffix window, then the middle
    /// matches. `None` means the incoming cell keeps its fresh identity.
    pub fn find_cached_index_for_incoming(
        &self,
        incoming_idx: usize,
        cached_len: usize,
        incoming_len: usize,
    ) -> Option<usize> {
        if incoming_idx >= incoming_len {
            return None;
        }
        if incoming_idx < self.stable_prefix {
            return Some(incoming_idx);
        }
        let from_end = incoming_len - incoming_idx;
        if from_end <= self.stable_suffix {
            return cached_len.checked_sub(from_end);
        }
        self.middle_matches
            .iter()
            .find(|(_, &inc)| inc == incoming_idx)
            .map(|(&cached, _)| cached)
    }
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalized_equal<A, B>(a: &A, b: &B) -> bool
where
    A: CellContent,
    B: CellContent,
{
    a.kind() == b.kind()
        && a.language() == b.language()
        && normalize_whitespace(a.text()) == normalize_whitespace(b.text())
}

/// Match a cached cell list against a freshly parsed one.
pub fn match_cell_data<A, B>(cached: &[A], incoming: &[B]) -> CellDataMatch
where
    A: CellContent,
    B: CellContent,
{
    let n = cached.len();
    let m = incoming.len();

    let mut prefix = 0;
    while prefix < n.min(m) && cells_equal(&cached[prefix], &incoming[prefix]) {
        prefix += 1;
    }
    if prefix == n && n == m {
        return CellDataMatch {
            stable_prefix: prefix,
            ..CellDataMatch::default()
        };
    }

    let max_suffix = (n - prefix).min(m - prefix);
    let mut suffix = 0;
    while suffix < max_suffix && cells_equal(&cached[n - 1 - suffix], &incoming[m - 1 - suffix]) {
        suffix += 1;
    }

    let mut cached_pool: Vec<usize> = (prefix..n - suffix).collect();
    let mut incoming_pool: Vec<usize> = (prefix..m - suffix).collect();
    let mut middle_matches = BTreeMap::new();

    let passes: [fn(&A, &B) -> bool; 2] = [cells_equal::<A, B>, normalized_equal::<A, B>];
    for same in passes {
        // Back-to-front so removals never shift indices still to be visited.
        for slot in (0..cached_pool.len()).rev() {
            let c = cached_pool[slot];
            if let Some(pos) = incoming_pool
                .iter()
                .rposition(|&i| same(&cached[c], &incoming[i]))
            {
                middle_matches.insert(c, incoming_pool.remove(pos));
                cached_pool.remove(slot);
            }
        }
    }

    CellDataMatch {
        stable_prefix: prefix,
        stable_suffix: suffix,
        middle_matches,
    }
}

/// Carry ids and outputs from `cached` onto matching `incoming` cells.
///
/// Unmatched incoming cells keep their freshly allocated ids.
pub fn enrich(cached: &[Cell], mut incoming: Vec<Cell>) -> Vec<Cell> {
    let result = match_cell_data(cached, &incoming);
    let incoming_len = incoming.len();
    for (idx, cell) in incoming.iter_mut().enumerate() {
        if let Some(prev) = result
            .find_cached_index_for_incoming(idx, cached.len(), incoming_len)
            .and_then(|c| cached.get(c))
        {
            cell.id = prev.id.clone();
            cell.outputs = prev.outputs.clone();
        }
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StableId;
    use crate::model::{CellKind, CellSnapshot, LanguageTag, OutputItem};

    fn snap(value: &str) -> CellSnapshot {
        CellSnapshot {
            kind: CellKind::Code,
            language: LanguageTag::GenericCode,
            value: value.to_owned(),
        }
    }

    fn cell(id: &str, value: &str) -> Cell {
        Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, value)
    }

    #[test]
    fn identical_lists_take_the_fast_path() {
        let a = [snap("x"), snap("y"), snap("z")];
        let r = match_cell_data(&a, &a);
        assert_eq!(r.stable_prefix, 3);
        assert_eq!(r.stable_suffix, 0);
        assert!(r.middle_matches.is_empty());
        for i in 0..3 {
            assert_eq!(r.find_cached_index_for_incoming(i, 3, 3), Some(i));
        }
    }

    #[test]
    fn swapped_cells_resolve_by_exact_content() {
        let cached = [snap("p"), snap("q")];
        let incoming = [snap("q"), snap("p")];
        let r = match_cell_data(&cached, &incoming);
        assert_eq!(r.stable_prefix, 0);
        assert_eq!(r.stable_suffix, 0);
        assert_eq!(r.find_cached_index_for_incoming(0, 2, 2), Some(1));
        assert_eq!(r.find_cached_index_for_incoming(1, 2, 2), Some(0));
    }

    #[test]
    fn whitespace_only_edits_match_in_the_second_pass() {
        let cached = [snap("a"), snap("x  =\t1"), snap("z")];
        let incoming = [snap("a"), snap("  x = 1 "), snap("new"), snap("z")];
        let r = match_cell_data(&cached, &incoming);
        assert_eq!(r.stable_prefix, 1);
        assert_eq!(r.stable_suffix, 1);
        assert_eq!(r.middle_matches.get(&1), Some(&1));
        assert_eq!(r.find_cached_index_for_incoming(2, 3, 4), None);
        assert_eq!(r.find_cached_index_for_incoming(3, 3, 4), Some(2));
    }

    #[test]
    fn exact_pass_runs_before_normalized_pass() {
        // "b b" normalizes to the same text as "b  b", but the exact twin wins.
        let cached = [snap("b  b"), snap("b b")];
        let incoming = [snap("b b"), snap("other")];
        let r = match_cell_data(&cached, &incoming);
        assert_eq!(r.middle_matches.get(&1), Some(&0));
        assert_eq!(r.middle_matches.get(&0), None);
    }

    #[test]
    fn normalization_does_not_cross_kinds() {
        let cached = [CellSnapshot {
            kind: CellKind::Markup,
            language: LanguageTag::Markdown,
            value: "x".into(),
        }];
        let incoming = [snap("x ")];
        assert!(match_cell_data(&cached, &incoming).middle_matches.is_empty());
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let r = match_cell_data::<CellSnapshot, CellSnapshot>(&[], &[]);
        assert_eq!(r.find_cached_index_for_incoming(0, 0, 0), None);
    }

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn enrich_moves_ids_and_outputs_to_reordered_cells() {
        let out = OutputItem {
            mime: "text/plain".into(),
            data: b"42".to_vec(),
        };
        let mut p = cell("p", "p = 1");
        p.outputs.push(out.clone());
        let cached = vec![p, cell("q", "q = 2")];
        let incoming = vec![cell("f1", "q = 2"), cell("f2", "p = 1"), cell("f3", "r = 3")];

        let got = enrich(&cached, incoming);
        let ids: Vec<_> = got.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["q", "p", "f3"]);
        assert_eq!(got[1].outputs, vec![out]);
        assert!(got[2].outputs.is_empty());
    }
}
