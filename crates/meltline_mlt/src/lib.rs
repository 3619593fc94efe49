//! Transcodes a meltline timeline into the MLT engine's XML document:
//! deduplicated producers, per-track playlists, two-slot transition
//! tractors, and one root composition, emitted in the strict top-down
//! order the engine resolves references in.
//!
//! ```no_run
//! use meltline_core::Timeline;
//! use meltline_mlt::{write_to_string, WriteOptions};
//!
//! # fn main() -> meltline_mlt::Result<()> {
//! let timeline = Timeline::load_from_file("edit.json").expect("model");
//! let xml = write_to_string(&timeline, &WriteOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod element;
pub mod error;
pub mod producer;
pub mod profile;
pub mod transition;

pub use assemble::{write_to_string, Input};
pub use element::Element;
pub use error::{MltError, Result};
pub use profile::{frame_rate_fraction, ProfileSetting, WriteOptions};
