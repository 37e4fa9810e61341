//! trawler-core: CSS selectors compiled to XPath 1.0
//!
//! This library provides:
//! - A CSS selector to XPath 1.0 compiler
//! - A thread-safe cache of compiled selectors
//! - Evaluation against XML documents through xee-xpath
//! - A fluent selection API and output formats

pub mod cache;
pub mod document;
pub mod output;
#[cfg(feature = "native")]
pub mod parallel;
pub mod selection;
pub mod selector;
pub mod xpath;

pub use cache::SelectorCache;
pub use document::{Document, TrawlerError};
pub use output::{format_matches, OutputFormat, OutputOptions};
#[cfg(feature = "native")]
pub use parallel::{expand_globs, trawl_document, trawl_file, trawl_files_parallel, TrawlOptions};
pub use selection::{Selection, Values};
pub use selector::{compile, parse, CompiledSelector, SelectorError};
pub use xpath::{timing_stats, Match, TimingStats, XPathEngine, XPathError};
