//! Reorder and reparent moves.
//!
//! A move is applied first and validated second. [`reorder`] never rejects a
//! move because of the relationships it creates, including cycles; callers
//! must re-run validation on the returned snapshot before treating it as
//! authoritative, so that a user interface can show the resulting error next
//! to the move that caused it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{Graph, Snapshot};

/// Errors that can occur when reordering positions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    /// The source or target index does not address a position.
    #[error("index {index} is out of bounds for {len} positions")]
    InvalidIndex {
        /// The offending index.
        index: usize,
        /// The number of positions in the snapshot.
        len: usize,
    },
}

/// A single structural move, as submitted by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    /// Index of the position to move.
    pub source_index: usize,
    /// Index the position is moved to. With `make_child`, the position
    /// currently at this index becomes the new superior.
    pub target_index: usize,
    /// Attach the moved position below the target instead of making it a
    /// root.
    #[serde(default)]
    pub make_child: bool,
}

impl ReorderRequest {
    /// Applies this move to a snapshot. See [`reorder`].
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidIndex`] if either index is out of
    /// bounds.
    pub fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot, ReorderError> {
        reorder(
            snapshot,
            self.source_index,
            self.target_index,
            self.make_child,
        )
    }
}

/// Moves the position at `source` to `target`.
///
/// The position is taken out of the sibling order and reinserted at
/// `target`. With `make_child`, it then reports to the position that was at
/// `target` before the move, and that position lists it as a subordinate;
/// without, it becomes a root. Either way it is removed from the subordinate
/// lists of its former superiors. The moved position keeps its own
/// subordinates, `order` is renumbered and every `level` is recomputed.
///
/// Moving a position onto itself returns the snapshot unchanged.
///
/// # Errors
///
/// Returns [`ReorderError::InvalidIndex`] if either index is out of bounds.
#[instrument(level = "debug", skip(snapshot), fields(positions = snapshot.len()))]
pub fn reorder(
    snapshot: &Snapshot,
    source: usize,
    target: usize,
    make_child: bool,
) -> Result<Snapshot, ReorderError> {
    let len = snapshot.len();
    if let Some(index) = [source, target].into_iter().find(|&index| index >= len) {
        return Err(ReorderError::InvalidIndex { index, len });
    }

    if source == target {
        debug!("source and target coincide, nothing to do");
        return Ok(snapshot.clone());
    }

    let mut positions = snapshot.positions().to_vec();
    let parent = make_child.then(|| {
        let parent = &positions[target];
        (parent.id.clone(), parent.name.clone(), parent.level)
    });

    let mut moved = positions.remove(source);

    for position in &mut positions {
        position
            .subordinates
            .retain(|reference| !moved.is_named_by(reference));
    }

    if let Some((parent_id, parent_name, parent_level)) = parent {
        moved.reports_to = vec![parent_name.to_string()];
        moved.level = parent_level + 1;
        if let Some(parent) = positions.iter_mut().find(|p| p.id == parent_id) {
            parent.subordinates.push(moved.name.to_string());
        }
        debug!(moved = %moved.name, parent = %parent_name, "attached as child");
    } else {
        moved.reports_to.clear();
        moved.level = 0;
        debug!(moved = %moved.name, "detached as root");
    }

    positions.insert(target, moved);
    for (order, position) in positions.iter_mut().enumerate() {
        position.order = order;
    }

    let result = Snapshot::from_positions(positions);

    if make_child && Graph::build(&result).is_ok_and(|graph| graph.has_cycles()) {
        warn!("move introduces a reporting cycle; accepted pending validation");
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{validate, Position, PositionInput};

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.iter().map(|p| p.name().as_str()).collect()
    }

    fn levels(snapshot: &Snapshot) -> Vec<usize> {
        snapshot.iter().map(Position::level).collect()
    }

    fn chain() -> Snapshot {
        Snapshot::load(vec![
            PositionInput::named("CEO"),
            PositionInput::named("CFO").reporting_to("CEO"),
            PositionInput::named("Controller").reporting_to("CFO"),
            PositionInput::named("Accountant").reporting_to("Controller"),
            PositionInput::named("Clerk").reporting_to("Accountant"),
        ])
        .unwrap()
    }

    #[test]
    fn out_of_bounds_indices_are_rejected() {
        let snapshot = chain();

        assert_eq!(
            reorder(&snapshot, 5, 0, false),
            Err(ReorderError::InvalidIndex { index: 5, len: 5 })
        );
        assert_eq!(
            reorder(&snapshot, 0, 7, true),
            Err(ReorderError::InvalidIndex { index: 7, len: 5 })
        );
    }

    #[test]
    fn moving_onto_itself_is_a_no_op() {
        let snapshot = chain();

        let result = reorder(&snapshot, 2, 2, true).unwrap();
        assert_eq!(result, snapshot);
    }

    #[test]
    fn detaching_makes_a_root_and_shifts_descendants() {
        let snapshot = chain();
        assert_eq!(levels(&snapshot), [0, 1, 2, 3, 4]);

        let result = reorder(&snapshot, 2, 0, false).unwrap();

        assert_eq!(
            names(&result),
            ["Controller", "CEO", "CFO", "Accountant", "Clerk"]
        );
        let controller = &result.positions()[0];
        assert_eq!(controller.level(), 0);
        assert!(controller.reports_to().is_empty());
        assert_eq!(controller.order(), 0);
        // every former descendant moves up by the same two levels
        assert_eq!(levels(&result), [0, 0, 1, 1, 2]);
    }

    #[test]
    fn attaching_sets_both_directions() {
        let snapshot = Snapshot::load(vec![
            PositionInput::named("CEO"),
            PositionInput::named("CFO").reporting_to("CEO"),
            PositionInput::named("CTO"),
        ])
        .unwrap();

        let result = reorder(&snapshot, 2, 1, true).unwrap();

        assert_eq!(names(&result), ["CEO", "CTO", "CFO"]);
        let cto = &result.positions()[1];
        assert_eq!(cto.reports_to(), ["CFO"]);
        assert_eq!(cto.level(), 2);
        assert_eq!(result.positions()[2].subordinates(), ["CTO"]);
    }

    #[test]
    fn moved_position_leaves_former_superiors() {
        let snapshot = Snapshot::load(vec![
            PositionInput {
                subordinates: vec!["Clerk".to_string()],
                ..PositionInput::named("Manager")
            },
            PositionInput::named("Director"),
            PositionInput::named("Clerk").reporting_to("Manager"),
        ])
        .unwrap();

        let result = reorder(&snapshot, 2, 1, true).unwrap();

        assert!(result.positions()[0].subordinates().is_empty());
        assert_eq!(result.positions()[1].reports_to(), ["Director"]);
        assert_eq!(result.positions()[2].subordinates(), ["Clerk"]);
    }

    #[test]
    fn cycle_introducing_move_is_accepted_and_flagged_by_validation() {
        let snapshot = Snapshot::load(vec![
            PositionInput::named("A"),
            PositionInput::named("B").reporting_to("A"),
        ])
        .unwrap();

        let result = reorder(&snapshot, 0, 1, true).unwrap();
        assert_eq!(result.positions()[1].reports_to(), ["B"]);

        let graph = Graph::build(&result).unwrap();
        let report = validate(&graph);
        assert!(!report.is_valid());
        assert!(report.errors[0].starts_with("circular reporting line:"));
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let request: ReorderRequest =
            serde_json::from_str(r#"{"sourceIndex": 2, "targetIndex": 0}"#).unwrap();

        assert_eq!(
            request,
            ReorderRequest {
                source_index: 2,
                target_index: 0,
                make_child: false,
            }
        );
        assert_eq!(levels(&request.apply(&chain()).unwrap())[0], 0);
    }
}
