//! Persistence of submitted form data.
//!
//! The hierarchy itself is never stored; a form document is the caller's
//! snapshot of positions, read at the start of a request and optionally
//! written back after a reorder.

mod form;
pub use form::{Form, FormError, Format};
