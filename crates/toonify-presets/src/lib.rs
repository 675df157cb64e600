//! toonify-presets: Named parameter presets with JSON persistence.
//!
//! A preset is a sparse override of the pipeline defaults saved under
//! a human-chosen name. The store always carries a handful of built-in
//! looks and can overlay user presets from a JSON file; hand-edited
//! files are screened for typos and out-of-domain values on load.

pub mod error;
pub mod patch;
pub mod store;

pub use error::PresetError;
pub use patch::PresetPatch;
pub use store::{PresetStore, Strictness};
