// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Open documents known to the session.
//!
//! Each entry holds the current cell list and the latest variable graph the
//! execution service reported. Reads hand out copies; the lock is never held
//! past the call.

use cellsync_core::{
    reconcile, topological_order, Cell, DependencyGraph, Document, DocumentId, StableId, VariableEdge,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Entry {
    document: Document,
    graph: DependencyGraph,
}

/// Store of open documents, owned by a session.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    docs: Mutex<HashMap<DocumentId, Entry>>,
}

impl DocumentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut HashMap<DocumentId, Entry>) -> T) -> T {
        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut docs)
    }

    /// Register `document` under `id`, replacing any previous entry.
    pub fn open(&self, id: DocumentId, document: Document) {
        self.with(|docs| {
            docs.insert(
                id,
                Entry {
                    document,
                    graph: DependencyGraph::default(),
                },
            );
        });
    }

    /// Forget `id`, returning its last document.
    pub fn close(&self, id: &DocumentId) -> Option<Document> {
        self.with(|docs| docs.remove(id).map(|e| e.document))
    }

    /// Apply a live cell-change event: carry ids, outputs and state from the
    /// current cells onto `new_cells` and store the result.
    ///
    /// `None` when `id` is not open.
    pub fn cells_changed(&self, id: &DocumentId, new_cells: Vec<Cell>) -> Option<Vec<Cell>> {
        self.with(|docs| {
            let entry = docs.get_mut(id)?;
            let merged = reconcile(&entry.document.cells, new_cells);
            debug!(document = %id, before = entry.document.cells.len(), after = merged.len(), "cells changed");
            entry.document.cells.clone_from(&merged);
            Some(merged)
        })
    }

    /// Replace the dependency graph of `id` with a freshly rebuilt edge set.
    /// Returns `false` when `id` is not open.
    pub fn update_dependencies(&self, id: &DocumentId, edges: Vec<VariableEdge>) -> bool {
        self.with(|docs| match docs.get_mut(id) {
            Some(entry) => {
                entry.graph = DependencyGraph::from_edges(edges);
                true
            }
            None => false,
        })
    }

    /// Fold a partial edge report into the graph of `id`, keeping edges for
    /// variables it does not mention. Returns `false` when `id` is not open.
    pub fn merge_dependencies(&self, id: &DocumentId, edges: Vec<VariableEdge>) -> bool {
        self.with(|docs| match docs.get_mut(id) {
            Some(entry) => {
                entry.graph.merge(edges);
                true
            }
            None => false,
        })
    }

    /// Drop the dependency graph of `id` (e.g. after a kernel restart).
    pub fn clear_dependencies(&self, id: &DocumentId) {
        self.with(|docs| {
            if let Some(entry) = docs.get_mut(id) {
                entry.graph = DependencyGraph::default();
            }
        });
    }

    /// Cells of `id` in dependency order.
    pub fn ordered_cells(&self, id: &DocumentId) -> Option<Vec<Cell>> {
        self.with(|docs| {
            let entry = docs.get(id)?;
            Some(
                topological_order(&entry.document.cells, &entry.graph)
                    .into_iter()
                    .cloned()
                    .collect(),
            )
        })
    }

    /// Copy of the current cells of `id`.
    pub fn cells(&self, id: &DocumentId) -> Option<Vec<Cell>> {
        self.with(|docs| docs.get(id).map(|e| e.document.cells.clone()))
    }

    /// Copy of the whole document `id`.
    pub fn document(&self, id: &DocumentId) -> Option<Document> {
        self.with(|docs| docs.get(id).map(|e| e.document.clone()))
    }

    /// Whether any cell of `id` carries one of `ids`.
    pub fn shares_any_id(&self, id: &DocumentId, ids: &HashSet<&StableId>) -> bool {
        self.with(|docs| {
            docs.get(id)
                .is_some_and(|e| e.document.cells.iter().any(|c| ids.contains(&c.id)))
        })
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.with(|docs| docs.len())
    }

    /// `true` when nothing is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cellsync_core::{CellKind, CellState, LanguageTag, OutputItem};

    fn cell(id: &str, value: &str) -> Cell {
        Cell::new(StableId::new(id), CellKind::Code, LanguageTag::GenericCode, value)
    }

    fn doc(cells: Vec<Cell>) -> Document {
        Document {
            cells,
            ..Document::default()
        }
    }

    #[test]
    fn cells_changed_keeps_identity_and_marks_edits_stale() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nb.py");
        let mut a = cell("a", "x = 1");
        a.outputs.push(OutputItem {
            mime: "text/plain".into(),
            data: b"1".to_vec(),
        });
        reg.open(id.clone(), doc(vec![a, cell("b", "y = x")]));

        let merged = reg
            .cells_changed(&id, vec![cell("n1", "x = 2"), cell("n2", "y = x"), cell("n3", "z = y")])
            .unwrap();
        let ids: Vec<_> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "n3"]);
        assert_eq!(merged[0].state, CellState::Stale);
        assert_eq!(reg.cells(&id).unwrap(), merged);
    }

    #[test]
    fn unknown_documents_are_none() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nope");
        assert!(reg.cells_changed(&id, vec![]).is_none());
        assert!(!reg.update_dependencies(&id, vec![]));
        assert!(reg.ordered_cells(&id).is_none());
        assert!(reg.close(&id).is_none());
    }

    #[test]
    fn ordered_cells_follow_reported_dependencies() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nb.py");
        reg.open(id.clone(), doc(vec![cell("2", "y = x"), cell("1", "x = 1")]));
        assert_eq!(reg.ordered_cells(&id).unwrap()[0].id.as_str(), "2");

        assert!(reg.update_dependencies(
            &id,
            vec![VariableEdge::new("x", [StableId::new("1")], [StableId::new("2")])]
        ));
        let order: Vec<_> = reg
            .ordered_cells(&id)
            .unwrap()
            .into_iter()
            .map(|c| c.id.as_str().to_owned())
            .collect();
        assert_eq!(order, vec!["1", "2"]);

        reg.clear_dependencies(&id);
        assert_eq!(reg.ordered_cells(&id).unwrap()[0].id.as_str(), "2");
    }

    fn order_of(reg: &DocumentRegistry, id: &DocumentId) -> Vec<String> {
        reg.ordered_cells(id)
            .unwrap()
            .into_iter()
            .map(|c| c.id.as_str().to_owned())
            .collect()
    }

    #[test]
    fn rebuilt_edges_replace_the_previous_graph() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nb.py");
        reg.open(id.clone(), doc(vec![cell("1", "x = 1"), cell("2", "y = x")]));

        reg.update_dependencies(
            &id,
            vec![VariableEdge::new("x", [StableId::new("1")], [StableId::new("2")])],
        );
        assert_eq!(order_of(&reg, &id), ["1", "2"]);

        // `x` is gone after the rerun; only `y` remains, declared by 2.
        reg.update_dependencies(
            &id,
            vec![VariableEdge::new("y", [StableId::new("2")], [StableId::new("1")])],
        );
        assert_eq!(order_of(&reg, &id), ["2", "1"]);
    }

    #[test]
    fn merged_edges_keep_unmentioned_variables() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nb.py");
        reg.open(id.clone(), doc(vec![cell("3", "print(y)"), cell("2", "y = x"), cell("1", "x = 1")]));

        reg.update_dependencies(
            &id,
            vec![VariableEdge::new("x", [StableId::new("1")], [StableId::new("2")])],
        );
        assert!(reg.merge_dependencies(
            &id,
            vec![VariableEdge::new("y", [StableId::new("2")], [StableId::new("3")])],
        ));
        assert_eq!(order_of(&reg, &id), ["1", "2", "3"]);
        assert!(!reg.merge_dependencies(&DocumentId::new("nope"), vec![]));
    }

    #[test]
    fn shares_any_id_checks_current_cells() {
        let reg = DocumentRegistry::new();
        let id = DocumentId::new("nb.py");
        reg.open(id.clone(), doc(vec![cell("a", "1")]));
        let a = StableId::new("a");
        let z = StableId::new("z");
        assert!(reg.shares_any_id(&id, &HashSet::from([&a])));
        assert!(!reg.shares_any_id(&id, &HashSet::from([&z])));
        assert_eq!(reg.len(), 1);
        reg.close(&id);
        assert!(reg.is_empty());
    }
}
