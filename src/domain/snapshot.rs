//! The position store.
//!
//! A [`Snapshot`] is the normalized, immutable set of positions for one
//! validation, reorder or render request.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    graph,
    position::{normalize, Position, PositionInput, PositionName},
};

/// Errors that can occur when loading raw position input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// A position has no name, or only whitespace.
    #[error("position #{} has no name", index + 1)]
    MissingName {
        /// Zero-based index of the offending position in the input list.
        index: usize,
    },

    /// Two positions carry the same explicit id.
    #[error("duplicate position id '{0}'")]
    DuplicateId(String),
}

/// An immutable, normalized copy of all positions of one document.
///
/// Positions are kept sorted by their sibling `order`; the index of a
/// position in [`Snapshot::positions`] is the index used by the reorder
/// engine and the hierarchy graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    positions: Vec<Position>,
}

impl Snapshot {
    /// Normalizes raw input into a snapshot.
    ///
    /// Strings are trimmed, blank optional fields become absent, relation
    /// lists are de-duplicated, missing ids are generated and missing
    /// `order` values default to the input index. Levels are derived from
    /// the resulting reports-to relation.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingName`] if any position lacks a name, or
    /// [`LoadError::DuplicateId`] if an explicit id is used twice.
    #[instrument(level = "debug", skip(inputs), fields(count = inputs.len()))]
    pub fn load(inputs: Vec<PositionInput>) -> Result<Self, LoadError> {
        let mut seen_ids = HashSet::with_capacity(inputs.len());
        let mut positions = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            let name = input
                .name
                .as_deref()
                .and_then(PositionName::new)
                .ok_or(LoadError::MissingName { index })?;

            let id = trimmed(input.id).unwrap_or_else(|| Uuid::new_v4().to_string());
            if !seen_ids.insert(id.clone()) {
                return Err(LoadError::DuplicateId(id));
            }

            positions.push(Position {
                id,
                name,
                employee_count: trimmed(input.employee_count),
                education_requirements: trimmed(input.education_requirements),
                experience_requirements: trimmed(input.experience_requirements),
                responsibilities: input
                    .responsibilities
                    .into_iter()
                    .map(|entry| entry.trim().to_string())
                    .collect(),
                reports_to: references(input.reports_to),
                subordinates: references(input.subordinates),
                level: 0,
                order: input.order.unwrap_or(index),
            });
        }

        // stable, so equal `order` values keep their input sequence
        positions.sort_by_key(|position| position.order);

        let snapshot = Self::from_positions(positions);
        debug!(positions = snapshot.len(), "loaded snapshot");
        Ok(snapshot)
    }

    /// Wraps already-normalized positions and derives their levels.
    pub(crate) fn from_positions(mut positions: Vec<Position>) -> Self {
        graph::assign_levels(&mut positions);
        Self { positions }
    }

    /// All positions, in sibling order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// The position at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    /// Iterates over the positions in sibling order.
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// The number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the snapshot holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Finds a position by its display name, compared case-insensitively.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Position> {
        let key = normalize(name);
        self.positions
            .iter()
            .find(|position| position.name.normalized() == key)
    }

    /// Converts the snapshot back into the caller-facing input shape.
    #[must_use]
    pub fn to_inputs(&self) -> Vec<PositionInput> {
        self.positions.iter().map(PositionInput::from).collect()
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn references(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|reference| reference.trim().to_string())
        .filter(|reference| !reference.is_empty() && seen.insert(normalize(reference)))
        .collect()
}
