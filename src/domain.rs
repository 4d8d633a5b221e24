//! Domain model of a position hierarchy.
//!
//! Positions are loaded into an immutable [`Snapshot`], viewed as a
//! [`Graph`], validated, moved around by the reorder engine and rendered into
//! document blocks.

/// Positions and their raw input form.
pub mod position;
pub use position::{Position, PositionInput, PositionName};

pub mod snapshot;
pub use snapshot::{LoadError, Snapshot};

pub mod graph;
pub use graph::{BuildError, Graph};

pub mod validate;
pub use validate::{
    validate, validate_inputs, validate_snapshot, validate_with, ValidationOptions,
    ValidationReport,
};

pub mod reorder;
pub use reorder::{reorder, ReorderError, ReorderRequest};

pub mod render;
pub use render::{render, Block, PlainTextSink, RenderError, RenderOptions, Rendered, Sink};

pub mod view;
pub use view::{visible_rows, ExpandState};

mod config;
pub use config::Config;
