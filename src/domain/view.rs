//! Expand/collapse projection of the hierarchy.
//!
//! The projection is a pure function of the graph and a separate
//! [`ExpandState`]; collapsing a position never touches the graph itself.

use std::collections::HashSet;

use crate::domain::Graph;

/// Which positions are collapsed, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    collapsed: HashSet<String>,
}

impl ExpandState {
    /// Everything expanded.
    #[must_use]
    pub fn expanded() -> Self {
        Self::default()
    }

    /// Collapses a position. Returns `false` if it already was.
    pub fn collapse(&mut self, id: impl Into<String>) -> bool {
        self.collapsed.insert(id.into())
    }

    /// Expands a position. Returns `false` if it was not collapsed.
    pub fn expand(&mut self, id: &str) -> bool {
        self.collapsed.remove(id)
    }

    /// Flips a position between collapsed and expanded.
    pub fn toggle(&mut self, id: &str) {
        if !self.expand(id) {
            self.collapse(id);
        }
    }

    /// Whether a position is collapsed.
    #[must_use]
    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }
}

/// One visible line of the projected tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Snapshot index of the position.
    pub index: usize,
    /// Indentation depth.
    pub depth: usize,
    /// Whether the position has subordinates, shown or not.
    pub has_children: bool,
    /// Whether the position's subordinates are hidden.
    pub collapsed: bool,
}

/// The rows visible under the given expand state.
///
/// Rows follow the document order of [`Graph::walk`]. Descendants of a
/// collapsed position are left out.
#[must_use]
pub fn visible_rows(graph: &Graph, state: &ExpandState) -> Vec<Row> {
    let mut hidden = vec![false; graph.len()];
    let mut rows = Vec::new();

    for visit in graph.walk() {
        if let Some(parent) = visit.parent {
            if hidden[parent] || state.is_collapsed(graph.position(parent).id()) {
                hidden[visit.index] = true;
                continue;
            }
        }

        let has_children = !graph.subordinates(visit.index).is_empty();
        rows.push(Row {
            index: visit.index,
            depth: visit.depth,
            has_children,
            collapsed: has_children && state.is_collapsed(graph.position(visit.index).id()),
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionInput, Snapshot};

    fn snapshot() -> Snapshot {
        Snapshot::load(vec![
            PositionInput {
                id: Some("ceo".to_string()),
                ..PositionInput::named("CEO")
            },
            PositionInput {
                id: Some("cfo".to_string()),
                ..PositionInput::named("CFO").reporting_to("CEO")
            },
            PositionInput::named("Accountant").reporting_to("CFO"),
            PositionInput::named("CTO").reporting_to("CEO"),
        ])
        .unwrap()
    }

    fn visible_names(graph: &Graph, state: &ExpandState) -> Vec<(String, usize)> {
        visible_rows(graph, state)
            .into_iter()
            .map(|row| (graph.position(row.index).name().to_string(), row.depth))
            .collect()
    }

    #[test]
    fn everything_is_visible_when_expanded() {
        let snapshot = snapshot();
        let graph = Graph::build(&snapshot).unwrap();

        let rows = visible_names(&graph, &ExpandState::expanded());
        assert_eq!(
            rows,
            [
                ("CEO".to_string(), 0),
                ("CFO".to_string(), 1),
                ("Accountant".to_string(), 2),
                ("CTO".to_string(), 1),
            ]
        );
    }

    #[test]
    fn collapsing_hides_descendants_only() {
        let snapshot = snapshot();
        let graph = Graph::build(&snapshot).unwrap();
        let mut state = ExpandState::expanded();
        state.collapse("cfo");

        let rows = visible_rows(&graph, &state);
        let names: Vec<_> = rows
            .iter()
            .map(|row| graph.position(row.index).name().as_str())
            .collect();
        assert_eq!(names, ["CEO", "CFO", "CTO"]);
        assert!(rows[1].collapsed);
        assert!(!rows[0].collapsed);
    }

    #[test]
    fn collapsing_the_root_hides_the_whole_tree() {
        let snapshot = snapshot();
        let graph = Graph::build(&snapshot).unwrap();
        let mut state = ExpandState::expanded();
        state.collapse("ceo");

        assert_eq!(visible_names(&graph, &state), [("CEO".to_string(), 0)]);
    }

    #[test]
    fn toggle_round_trips() {
        let mut state = ExpandState::expanded();
        state.toggle("ceo");
        assert!(state.is_collapsed("ceo"));
        state.toggle("ceo");
        assert!(!state.is_collapsed("ceo"));
    }

    #[test]
    fn projection_leaves_graph_untouched() {
        let snapshot = snapshot();
        let graph = Graph::build(&snapshot).unwrap();
        let mut state = ExpandState::expanded();
        state.collapse("ceo");

        let _ = visible_rows(&graph, &state);
        assert_eq!(graph.subordinates(0), [1, 3]);
        assert_eq!(graph.walk().len(), 4);
    }
}
