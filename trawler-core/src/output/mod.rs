//! Output formatting for query results
//!
//! Supports multiple output formats:
//! - xml: XML of matched nodes
//! - text: Text content of matched node (or the requested attribute)
//! - count: Number of matches
//! - json: JSON array with match details
//! - paths: Absolute location path of each match

mod colors;
mod formatter;

pub use colors::{ansi, paint};
#[cfg(feature = "native")]
pub use colors::should_use_color;
pub use formatter::{format_matches, OutputFormat, OutputOptions};
