//! Report formatting.

pub mod json;
pub mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_bytes, format_curves, format_descriptors, format_report};
