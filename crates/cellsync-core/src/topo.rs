// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dependency-respecting presentation order.
//!
//! The execution service reports, per variable, which cells declare it and
//! which cells use it. [`topological_order`] turns that into a display order
//! where every declaring cell precedes its users. Ordering is best effort:
//! cycles are broken by original position and cells the graph has never seen
//! keep their relative order at the end.

use crate::ids::StableId;
use crate::model::Cell;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

/// Declarers and users of one variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariableEdge {
    /// Variable name.
    pub name: String,
    /// Cells that define the variable.
    #[serde(default)]
    pub declared_by: BTreeSet<StableId>,
    /// Cells that read the variable.
    #[serde(default)]
    pub used_by: BTreeSet<StableId>,
}

impl VariableEdge {
    /// Edge for `name` with the given declarers and users.
    pub fn new(
        name: impl Into<String>,
        declared_by: impl IntoIterator<Item = StableId>,
        used_by: impl IntoIterator<Item = StableId>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_by: declared_by.into_iter().collect(),
            used_by: used_by.into_iter().collect(),
        }
    }
}

/// Variable graph for one document, keyed by variable name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    variables: BTreeMap<String, VariableEdge>,
}

impl DependencyGraph {
    /// Build a graph from edges; later edges for the same name win.
    pub fn from_edges(edges: impl IntoIterator<Item = VariableEdge>) -> Self {
        let mut graph = Self::default();
        graph.merge(edges);
        graph
    }

    /// Insert edges, replacing any existing edge for the same variable.
    /// Variables not mentioned keep their edges.
    pub fn merge(&mut self, edges: impl IntoIterator<Item = VariableEdge>) {
        for edge in edges {
            self.variables.insert(edge.name.clone(), edge);
        }
    }

    /// `true` until the execution service reports anything.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Every cell id mentioned by any edge.
    pub fn nodes(&self) -> BTreeSet<&StableId> {
        self.variables
            .values()
            .flat_map(|e| e.declared_by.iter().chain(&e.used_by))
            .collect()
    }

    /// Edges in variable-name order.
    pub fn edges(&self) -> impl Iterator<Item = &VariableEdge> + '_ {
        self.variables.values()
    }
}

/// Order `cells` so declarers precede users. Never fails.
pub fn topological_order<'a>(cells: &'a [Cell], graph: &DependencyGraph) -> Vec<&'a Cell> {
    if cells.is_empty() {
        return Vec::new();
    }
    if graph.is_empty() {
        return cells.iter().collect();
    }

    let nodes = graph.nodes();
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    let mut slot_of: HashMap<&StableId, usize> = HashMap::new();
    for cell in cells {
        if nodes.contains(&cell.id) && !slot_of.contains_key(&cell.id) {
            slot_of.insert(&cell.id, known.len());
            known.push(cell);
        } else {
            unknown.push(cell);
        }
    }

    // Slot indices follow original order, so the smallest ready slot is the
    // stable choice.
    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); known.len()];
    for edge in graph.edges() {
        for decl in edge.declared_by.iter().filter_map(|id| slot_of.get(id)) {
            for user in edge.used_by.iter().filter_map(|id| slot_of.get(id)) {
                if decl != user {
                    successors[*decl].insert(*user);
                }
            }
        }
    }
    let mut indegree = vec![0usize; known.len()];
    for succ in &successors {
        for &s in succ {
            indegree[s] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut emitted = vec![false; known.len()];
    let mut out = Vec::with_capacity(cells.len());

    while out.len() < known.len() {
        let next = match ready.pop() {
            Some(Reverse(i)) if emitted[i] => continue,
            Some(Reverse(i)) => i,
            // Cycle: force the lowest remaining slot.
            None => match emitted.iter().position(|&e| !e) {
                Some(i) => i,
                None => break,
            },
        };
        emitted[next] = true;
        out.push(known[next]);
        for &s in &successors[next] {
            if emitted[s] {
                continue;
            }
            indegree[s] = indegree[s].saturating_sub(1);
            if indegree[s] == 0 {
                ready.push(Reverse(s));
            }
        }
    }

    out.extend(unknown);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellKind, LanguageTag};

    fn cell(id: &str) -> Cell {
        Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, id)
    }

    fn sid(id: &str) -> StableId {
        StableId::new(id)
    }

    fn order(cells: &[Cell], graph: &DependencyGraph) -> Vec<String> {
        topological_order(cells, graph)
            .into_iter()
            .map(|c| c.id.as_str().to_owned())
            .collect()
    }

    #[test]
    fn empty_graph_keeps_document_order() {
        let cells = [cell("b"), cell("a"), cell("c")];
        assert_eq!(order(&cells, &DependencyGraph::default()), vec!["b", "a", "c"]);
        assert!(topological_order(&[], &DependencyGraph::default()).is_empty());
    }

    #[test]
    fn declarer_moves_before_user() {
        let cells = [cell("2"), cell("1")];
        let graph = DependencyGraph::from_edges([VariableEdge::new("x", [sid("1")], [sid("2")])]);
        assert_eq!(order(&cells, &graph), vec!["1", "2"]);
    }

    #[test]
    fn unconstrained_cells_keep_relative_order() {
        let cells = [cell("u"), cell("a"), cell("b"), cell("d")];
        let graph = DependencyGraph::from_edges([
            VariableEdge::new("x", [sid("d")], [sid("u")]),
            VariableEdge::new("y", [sid("a")], []),
            VariableEdge::new("z", [sid("b")], []),
        ]);
        assert_eq!(order(&cells, &graph), vec!["a", "b", "d", "u"]);
    }

    #[test]
    fn unknown_cells_are_appended_in_order() {
        let cells = [cell("new1"), cell("2"), cell("new2"), cell("1")];
        let graph = DependencyGraph::from_edges([VariableEdge::new("x", [sid("1")], [sid("2")])]);
        assert_eq!(order(&cells, &graph), vec!["1", "2", "new1", "new2"]);
    }

    #[test]
    fn cycles_break_on_original_position() {
        let cells = [cell("a"), cell("b"), cell("c")];
        let graph = DependencyGraph::from_edges([
            VariableEdge::new("x", [sid("a")], [sid("b")]),
            VariableEdge::new("y", [sid("b")], [sid("a")]),
            VariableEdge::new("z", [sid("c")], [sid("a")]),
        ]);
        let got = order(&cells, &graph);
        assert_eq!(got.len(), 3);
        // `c` has no inputs; the a/b cycle is then broken at `a`.
        assert_eq!(got, vec!["c", "a", "b"]);
    }

    #[test]
    fn self_use_is_not_a_dependency() {
        let cells = [cell("a")];
        let graph = DependencyGraph::from_edges([VariableEdge::new("x", [sid("a")], [sid("a")])]);
        assert_eq!(order(&cells, &graph), vec!["a"]);
    }

    #[test]
    fn update_replaces_edges_by_name() {
        let mut graph = DependencyGraph::from_edges([VariableEdge::new("x", [sid("1")], [sid("2")])]);
        graph.merge([VariableEdge::new("x", [sid("2")], [sid("1")])]);
        let cells = [cell("1"), cell("2")];
        assert_eq!(order(&cells, &graph), vec!["2", "1"]);
        assert_eq!(graph.nodes().len(), 2);
    }
}
