//! XPath evaluation using xee-xpath
//!
//! The XPath 1.0 expressions emitted by [`crate::selector`] are run by the
//! xee-xpath 3.1 engine. Same-name sibling checks that XPath 1.0 cannot
//! express are applied in Rust by the [`host`] filter.

mod engine;
pub mod host;
mod match_result;

pub use engine::{timing_stats, TimingStats, XPathEngine};
pub use match_result::Match;

use thiserror::Error;

/// Errors that can occur during XPath evaluation
#[derive(Error, Debug)]
pub enum XPathError {
    #[error("Failed to compile XPath: {0}")]
    Compile(String),
    #[error("Failed to execute XPath: {0}")]
    Execute(String),
    #[error("Failed to parse XML: {0}")]
    XmlParse(String),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}
