//! Loaded XML documents

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use xee_xpath::Documents;
use xot::Node;

use crate::cache::SelectorCache;
use crate::selection::Selection;
use crate::selector::SelectorError;
use crate::xpath::{XPathEngine, XPathError};

/// Errors surfaced by [`Document`] and [`Selection`]
#[derive(Error, Debug)]
pub enum TrawlerError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    XPath(#[from] XPathError),
}

/// One parsed XML document together with the engine and selector cache
/// used to query it
///
/// A document is single-threaded; to process many files in parallel, load
/// one `Document` per file and share a [`SelectorCache`] between them.
pub struct Document {
    documents: RefCell<Documents>,
    root: Node,
    engine: XPathEngine,
    cache: Arc<SelectorCache>,
    path: Option<PathBuf>,
}

impl Document {
    /// Parse XML text
    pub fn from_xml(xml: &str) -> Result<Self, TrawlerError> {
        let engine = XPathEngine::new();
        let mut documents = Documents::new();
        let root = engine.load(&mut documents, xml)?;
        Ok(Document {
            documents: RefCell::new(documents),
            root,
            engine,
            cache: Arc::new(SelectorCache::new()),
            path: None,
        })
    }

    /// Read and parse an XML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TrawlerError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(XPathError::from)?;
        let mut document = Self::from_xml(&xml)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Share a selector cache with other documents
    pub fn with_cache(mut self, cache: Arc<SelectorCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Log every XPath expression run against this document
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.engine = self.engine.with_verbose(verbose);
        self
    }

    /// The file this document was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn cache(&self) -> &Arc<SelectorCache> {
        &self.cache
    }

    /// Selection holding just the document node
    pub fn root(&self) -> Selection<'_> {
        Selection::new(self, vec![self.root], true)
    }

    /// Shorthand for `root().select(selector)`
    pub fn select(&self, selector: &str) -> Result<Selection<'_>, TrawlerError> {
        self.root().select(selector)
    }

    pub(crate) fn engine(&self) -> &XPathEngine {
        &self.engine
    }

    pub(crate) fn documents(&self) -> &RefCell<Documents> {
        &self.documents
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("cached_selectors", &self.cache.len())
            .finish()
    }
}
