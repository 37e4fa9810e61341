//! Parallel file processing using Rayon

use std::path::Path;
use std::sync::Arc;

use log::warn;
use rayon::prelude::*;

use crate::cache::SelectorCache;
use crate::document::{Document, TrawlerError};
use crate::xpath::Match;

/// What to pull out of every input
#[derive(Debug, Clone, Default)]
pub struct TrawlOptions {
    /// CSS selector run from the document node
    pub selector: String,
    /// Report this attribute instead of the node
    pub attr: Option<String>,
    /// Drop nodes reached more than once
    pub unique: bool,
    /// Log every executed XPath expression
    pub verbose: bool,
}

/// Run the selector against one parsed document
pub fn trawl_document(
    document: &Document,
    file: &str,
    options: &TrawlOptions,
) -> Result<Vec<Match>, TrawlerError> {
    let mut found = document.select(&options.selector)?;
    if options.unique {
        found = found.unique();
    }
    found.to_matches(file, options.attr.as_deref())
}

/// Load and trawl one file
pub fn trawl_file(
    path: &Path,
    options: &TrawlOptions,
    cache: &Arc<SelectorCache>,
) -> Result<Vec<Match>, TrawlerError> {
    let document = Document::from_file(path)?
        .with_cache(Arc::clone(cache))
        .with_verbose(options.verbose);
    trawl_document(&document, &path.to_string_lossy(), options)
}

/// Trawl multiple files in parallel, sharing one selector cache.
///
/// Results come back in the order of `files`.
pub fn trawl_files_parallel<P: AsRef<Path> + Sync>(
    files: &[P],
    options: &TrawlOptions,
    cache: &Arc<SelectorCache>,
) -> Vec<Result<Vec<Match>, TrawlerError>> {
    files
        .par_iter()
        .map(|path| trawl_file(path.as_ref(), options, cache))
        .collect()
}

/// Expand glob patterns to file paths
pub fn expand_globs(patterns: &[String]) -> Vec<String> {
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') {
            match glob::glob(pattern) {
                Ok(paths) => {
                    for entry in paths.flatten() {
                        if entry.is_file() {
                            if let Some(path) = entry.to_str() {
                                files.push(path.to_string());
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("invalid glob pattern '{}': {}", pattern, e);
                }
            }
        } else {
            // Not a glob, use as-is
            files.push(pattern.clone());
        }
    }

    files
}
