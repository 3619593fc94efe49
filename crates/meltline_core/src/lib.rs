//! Editorial timeline model for meltline.
//!
//! The model is assumed to arrive already validated (from an upstream
//! editor or interchange format); this crate only defines the schema,
//! JSON persistence, and the transition-expansion pass the transcoder
//! consumes.

pub mod error;
pub mod expand;
mod timeline;
pub mod types;

pub use error::{CoreError, Result};
pub use expand::{expand_track, ExpandedItem, ExpandedTransition};
pub use types::*;
