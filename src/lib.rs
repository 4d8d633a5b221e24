//! Organizational position hierarchies
//!
//! Positions reference each other by name. This crate turns a submitted list
//! of positions into a graph, validates its structure, applies reorder moves
//! and renders the accepted hierarchy into numbered document blocks.

pub mod domain;
pub use domain::{
    render, reorder, validate, Block, Config, Graph, Position, PositionInput, Rendered,
    Snapshot, ValidationReport,
};

/// Reading and writing form documents.
pub mod storage;
pub use storage::Form;
