//! The hierarchy graph.
//!
//! The [`Graph`] is a derived view over a [`Snapshot`]. Names and ids are
//! interned into snapshot indices once, when the graph is built; every
//! traversal afterwards works on indices only.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
};

use nonempty::NonEmpty;
use petgraph::{
    algo::is_cyclic_directed,
    graph::{DiGraph, NodeIndex},
    Direction,
};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{position::normalize, Position, Snapshot};

/// Which of a position's relation lists a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    /// The `reports_to` list.
    ReportsTo,
    /// The `subordinates` list.
    Subordinates,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ReportsTo => f.write_str("reports to"),
            Self::Subordinates => f.write_str("subordinates"),
        }
    }
}

/// A reference that does not resolve to any position in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Index of the position holding the reference.
    pub position: usize,
    /// The list the reference was found in.
    pub relation: Relation,
    /// The reference as written.
    pub reference: String,
}

/// A position that names itself in one of its relation lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfReference {
    /// Index of the position.
    pub position: usize,
    /// The list the reference was found in.
    pub relation: Relation,
}

/// Two positions whose names collide once normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateName {
    /// The name of the later position, as written.
    pub name: String,
    /// Index of the first position using the name.
    pub first: usize,
    /// Index of the colliding position.
    pub second: usize,
}

impl fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "duplicate position name '{}' (positions #{} and #{})",
            self.name,
            self.first + 1,
            self.second + 1
        )
    }
}

/// Errors that can occur when building the hierarchy graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Relations are resolved through names, so names must be unique.
    #[error("{}", display_duplicates(.0))]
    DuplicateNames(NonEmpty<DuplicateName>),
}

fn display_duplicates(duplicates: &NonEmpty<DuplicateName>) -> String {
    duplicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Which side(s) of a reports-to edge declared it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Declared {
    /// The subordinate lists the superior in its `reports_to`.
    pub by_subordinate: bool,
    /// The superior lists the subordinate in its `subordinates`.
    pub by_superior: bool,
}

/// Adjacency view over a snapshot.
///
/// Nodes are snapshot indices. Edges point from subordinate to superior.
#[derive(Debug)]
pub struct Graph<'a> {
    snapshot: &'a Snapshot,
    graph: DiGraph<usize, Declared>,
    dangling: Vec<DanglingReference>,
    self_references: Vec<SelfReference>,
}

impl<'a> Graph<'a> {
    /// Builds the graph for a snapshot.
    ///
    /// Unresolved references are recorded rather than rejected, see
    /// [`Graph::dangling`]. Self references never become edges.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateNames`] listing every name collision.
    #[instrument(level = "debug", skip(snapshot), fields(positions = snapshot.len()))]
    pub fn build(snapshot: &'a Snapshot) -> Result<Self, BuildError> {
        let resolved = Resolved::new(snapshot.positions());

        if let Some(duplicates) = NonEmpty::from_vec(resolved.duplicates) {
            return Err(BuildError::DuplicateNames(duplicates));
        }

        let mut graph = DiGraph::with_capacity(snapshot.len(), resolved.edges.len());
        for index in 0..snapshot.len() {
            graph.add_node(index);
        }
        for ((subordinate, superior), declared) in resolved.edges {
            graph.add_edge(
                NodeIndex::new(subordinate),
                NodeIndex::new(superior),
                declared,
            );
        }

        tracing::debug!(
            edges = graph.edge_count(),
            dangling = resolved.dangling.len(),
            "built hierarchy graph"
        );

        Ok(Self {
            snapshot,
            graph,
            dangling: resolved.dangling,
            self_references: resolved.self_references,
        })
    }

    /// The snapshot this graph was built from.
    #[must_use]
    pub const fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// The position at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a node of this graph.
    #[must_use]
    pub fn position(&self, index: usize) -> &'a Position {
        &self.snapshot.positions()[index]
    }

    /// The number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Resolved superiors of a position, in sibling order.
    #[must_use]
    pub fn superiors(&self, index: usize) -> Vec<usize> {
        self.neighbours(index, Direction::Outgoing)
    }

    /// Resolved subordinates of a position, in sibling order.
    #[must_use]
    pub fn subordinates(&self, index: usize) -> Vec<usize> {
        self.neighbours(index, Direction::Incoming)
    }

    /// Positions without any resolved superior, in sibling order.
    #[must_use]
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&index| {
                self.graph
                    .neighbors_directed(NodeIndex::new(index), Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Whether any edge touches this position, whoever declared it.
    #[must_use]
    pub fn is_linked(&self, index: usize) -> bool {
        self.graph
            .neighbors_undirected(NodeIndex::new(index))
            .next()
            .is_some()
    }

    /// How the edge from `subordinate` to `superior` was declared, if it
    /// exists.
    #[must_use]
    pub fn declared(&self, subordinate: usize, superior: usize) -> Option<Declared> {
        self.graph
            .find_edge(NodeIndex::new(subordinate), NodeIndex::new(superior))
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    /// References that did not resolve, in sibling order of their holder.
    #[must_use]
    pub fn dangling(&self) -> &[DanglingReference] {
        &self.dangling
    }

    /// Positions naming themselves, in sibling order.
    #[must_use]
    pub fn self_references(&self) -> &[SelfReference] {
        &self.self_references
    }

    /// Whether the reports-to relation contains a cycle.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Walks the hierarchy depth-first in document order.
    ///
    /// Roots are visited in sibling order, and below each position its
    /// subordinates in sibling order, before moving on to the next sibling.
    /// Every position is visited exactly once: a position with several
    /// superiors appears under the first one reached, and positions that no
    /// root reaches (members of a cycle) start their own walk afterwards, in
    /// sibling order.
    #[must_use]
    pub fn walk(&self) -> Vec<Visit> {
        let mut visited = vec![false; self.len()];
        let mut visits = Vec::with_capacity(self.len());

        let starts = self.roots().into_iter().chain(0..self.len());
        for start in starts {
            let mut stack = vec![Visit {
                index: start,
                depth: 0,
                parent: None,
            }];

            while let Some(visit) = stack.pop() {
                if visited[visit.index] {
                    continue;
                }
                visited[visit.index] = true;
                visits.push(visit);

                stack.extend(
                    self.subordinates(visit.index)
                        .into_iter()
                        .rev()
                        .filter(|&child| !visited[child])
                        .map(|child| Visit {
                            index: child,
                            depth: visit.depth + 1,
                            parent: Some(visit.index),
                        }),
                );
            }
        }

        visits
    }

    fn neighbours(&self, index: usize, direction: Direction) -> Vec<usize> {
        let mut neighbours: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(index), direction)
            .map(NodeIndex::index)
            .collect();
        neighbours.sort_unstable();
        neighbours
    }
}

/// One step of [`Graph::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Snapshot index of the position.
    pub index: usize,
    /// Distance from the position the walk started at.
    pub depth: usize,
    /// The position this one was reached from.
    pub parent: Option<usize>,
}

/// Lookup from references to snapshot indices.
///
/// The first position wins when two names collide; collisions are kept in
/// `duplicates` for the caller to act on.
struct NameIndex {
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    duplicates: Vec<DuplicateName>,
}

impl NameIndex {
    fn new(positions: &[Position]) -> Self {
        let mut by_id = HashMap::with_capacity(positions.len());
        let mut by_name = HashMap::with_capacity(positions.len());
        let mut duplicates = Vec::new();

        for (index, position) in positions.iter().enumerate() {
            by_id.entry(position.id.clone()).or_insert(index);

            match by_name.get(&position.name.normalized()) {
                Some(&first) => duplicates.push(DuplicateName {
                    name: position.name.to_string(),
                    first,
                    second: index,
                }),
                None => {
                    by_name.insert(position.name.normalized(), index);
                }
            }
        }

        Self {
            by_id,
            by_name,
            duplicates,
        }
    }

    fn resolve(&self, reference: &str) -> Option<usize> {
        self.by_id
            .get(reference.trim())
            .or_else(|| self.by_name.get(&normalize(reference)))
            .copied()
    }
}

/// The relation lists of a snapshot, resolved to indices.
struct Resolved {
    /// Keyed by (subordinate, superior).
    edges: BTreeMap<(usize, usize), Declared>,
    dangling: Vec<DanglingReference>,
    self_references: Vec<SelfReference>,
    duplicates: Vec<DuplicateName>,
}

impl Resolved {
    fn new(positions: &[Position]) -> Self {
        let index = NameIndex::new(positions);
        let mut edges: BTreeMap<(usize, usize), Declared> = BTreeMap::new();
        let mut dangling = Vec::new();
        let mut self_references = Vec::new();

        for (position, holder) in positions.iter().enumerate() {
            let lists = [
                (Relation::ReportsTo, &holder.reports_to),
                (Relation::Subordinates, &holder.subordinates),
            ];

            for (relation, references) in lists {
                for reference in references {
                    match index.resolve(reference) {
                        Some(other) if other == position => {
                            self_references.push(SelfReference { position, relation });
                        }
                        Some(other) => {
                            let (key, by_subordinate) = match relation {
                                Relation::ReportsTo => ((position, other), true),
                                Relation::Subordinates => ((other, position), false),
                            };
                            let declared = edges.entry(key).or_default();
                            if by_subordinate {
                                declared.by_subordinate = true;
                            } else {
                                declared.by_superior = true;
                            }
                        }
                        None => dangling.push(DanglingReference {
                            position,
                            relation,
                            reference: reference.clone(),
                        }),
                    }
                }
            }
        }

        Self {
            edges,
            dangling,
            self_references,
            duplicates: index.duplicates,
        }
    }
}

/// Recomputes `level` for every position.
///
/// Roots (no resolved superior) get level 0, everything else gets the
/// breadth-first distance from the nearest root along inverse reports-to
/// edges. Positions unreachable from any root, such as members of a pure
/// cycle, get level 0.
pub(crate) fn assign_levels(positions: &mut [Position]) {
    let resolved = Resolved::new(positions);

    let mut children = vec![Vec::new(); positions.len()];
    let mut has_superior = vec![false; positions.len()];
    for &(subordinate, superior) in resolved.edges.keys() {
        children[superior].push(subordinate);
        has_superior[subordinate] = true;
    }

    let mut levels: Vec<Option<usize>> = vec![None; positions.len()];
    let mut queue: VecDeque<usize> = (0..positions.len())
        .filter(|&index| !has_superior[index])
        .collect();
    for &root in &queue {
        levels[root] = Some(0);
    }

    while let Some(index) = queue.pop_front() {
        let next = levels[index].unwrap_or_default() + 1;
        for &child in &children[index] {
            if levels[child].is_none() {
                levels[child] = Some(next);
                queue.push_back(child);
            }
        }
    }

    for (position, level) in positions.iter_mut().zip(levels) {
        position.level = level.unwrap_or_default();
    }
}
