//! XPath engine implementation over xee-xpath

use super::{host, XPathError};
use crate::selector::{Query, SiblingCheck};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use xee_xpath::{query::SequenceQuery, Documents, Item, Queries, Query as _};
use xot::Node;

const DOCUMENT_URI: &str = "file:///trawler";
const PRECEDING_SIBLINGS: &str = "preceding-sibling::*";
const FOLLOWING_SIBLINGS: &str = "following-sibling::*";

// Timing stats (in microseconds) for profiling
static TIMING_XML_LOAD: AtomicU64 = AtomicU64::new(0);
static TIMING_QUERY_EXEC: AtomicU64 = AtomicU64::new(0);
static TIMING_HOST_FILTER: AtomicU64 = AtomicU64::new(0);
static DOCUMENT_COUNT: AtomicU64 = AtomicU64::new(0);
static QUERY_COUNT: AtomicU64 = AtomicU64::new(0);

/// Accumulated evaluation timings, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingStats {
    pub documents: u64,
    pub queries: u64,
    pub xml_load: u64,
    pub query_exec: u64,
    pub host_filter: u64,
}

impl TimingStats {
    /// One-line summary for verbose output
    pub fn summary(&self) -> String {
        format!(
            "{} documents, {} queries: xml load {:.2}ms, query exec {:.2}ms, host filter {:.2}ms",
            self.documents,
            self.queries,
            self.xml_load as f64 / 1000.0,
            self.query_exec as f64 / 1000.0,
            self.host_filter as f64 / 1000.0,
        )
    }
}

/// Snapshot of the timings gathered by every engine in this process
pub fn timing_stats() -> TimingStats {
    TimingStats {
        documents: DOCUMENT_COUNT.load(Ordering::Relaxed),
        queries: QUERY_COUNT.load(Ordering::Relaxed),
        xml_load: TIMING_XML_LOAD.load(Ordering::Relaxed),
        query_exec: TIMING_QUERY_EXEC.load(Ordering::Relaxed),
        host_filter: TIMING_HOST_FILTER.load(Ordering::Relaxed),
    }
}

fn elapsed_micros(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

// Compiled xee programs, per thread: SequenceQuery is not Sync and
// selectors repeat across documents
thread_local! {
    static QUERY_CACHE: RefCell<HashMap<String, SequenceQuery>> = RefCell::new(HashMap::new());
}

/// Compile `xpath` once per thread and run it against `context`
fn execute_cached_query(
    documents: &mut Documents,
    context: Node,
    xpath: &str,
) -> Result<Vec<Item>, XPathError> {
    QUERY_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if !cache.contains_key(xpath) {
            let queries = Queries::default();
            let query = queries
                .sequence(xpath)
                .map_err(|e| XPathError::Compile(format!("{xpath}: {e}")))?;
            cache.insert(xpath.to_string(), query);
        }
        let query = cache
            .get(xpath)
            .ok_or_else(|| XPathError::Compile(xpath.to_string()))?;

        let start = Instant::now();
        let results = query
            .execute(documents, context)
            .map_err(|e: xee_xpath::error::Error| XPathError::Execute(e.to_string()))?;
        TIMING_QUERY_EXEC.fetch_add(elapsed_micros(start), Ordering::Relaxed);
        QUERY_COUNT.fetch_add(1, Ordering::Relaxed);

        Ok(results.iter().collect())
    })
}

/// XPath engine using xee-xpath
///
/// Compiled XPath programs are cached per thread, so evaluating the same
/// selector against many documents compiles it only once.
#[derive(Debug, Clone, Default)]
pub struct XPathEngine {
    verbose: bool,
}

impl XPathEngine {
    /// Create a new XPath engine
    pub fn new() -> Self {
        XPathEngine { verbose: false }
    }

    /// Log every executed expression
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parse `xml` into `documents`, returning the document node
    pub fn load(&self, documents: &mut Documents, xml: &str) -> Result<Node, XPathError> {
        let start = Instant::now();
        let handle = documents
            .add_string(DOCUMENT_URI.try_into().expect("static document URI is valid"), xml)
            .map_err(|e| XPathError::XmlParse(e.to_string()))?;
        let node = documents
            .document_node(handle)
            .ok_or_else(|| XPathError::XmlParse("document was not registered".to_string()))?;
        TIMING_XML_LOAD.fetch_add(elapsed_micros(start), Ordering::Relaxed);
        DOCUMENT_COUNT.fetch_add(1, Ordering::Relaxed);
        Ok(node)
    }

    /// Nodes selected by `xpath` relative to `context`; other items are dropped
    pub fn select(
        &self,
        documents: &mut Documents,
        context: Node,
        xpath: &str,
    ) -> Result<Vec<Node>, XPathError> {
        let nodes: Vec<Node> = execute_cached_query(documents, context, xpath)?
            .into_iter()
            .filter_map(|item| match item {
                Item::Node(node) => Some(node),
                _ => None,
            })
            .collect();
        if self.verbose {
            info!("{} -> {} nodes", xpath, nodes.len());
        }
        Ok(nodes)
    }

    /// String value of every item `expr` yields relative to `context`
    pub fn evaluate(
        &self,
        documents: &mut Documents,
        context: Node,
        expr: &str,
    ) -> Result<Vec<String>, XPathError> {
        let items = execute_cached_query(documents, context, expr)?;
        let xot = documents.xot();
        let values: Vec<String> = items
            .into_iter()
            .filter_map(|item| match item {
                Item::Node(node) => Some(xot.string_value(node)),
                Item::Atomic(atomic) => Some(atomic.to_string().unwrap_or_default()),
                Item::Function(_) => None,
            })
            .collect();
        if self.verbose {
            info!("{} -> {:?}", expr, values);
        }
        Ok(values)
    }

    /// Run a compiled selector relative to `context`.
    ///
    /// Plain queries go to xee in one call. Queries with same-name checks on
    /// tag-less steps run segment by segment, filtering in between. The
    /// result is in document order without duplicates.
    pub fn select_query(
        &self,
        documents: &mut Documents,
        context: Node,
        query: &Query,
    ) -> Result<Vec<Node>, XPathError> {
        if query.is_plain() {
            return self.select(documents, context, &query.to_string());
        }

        let mut found = Vec::new();
        for alternative in query.alternatives() {
            if alternative.is_empty() {
                continue;
            }

            let mut contexts = vec![context];
            for segment in alternative.segments() {
                let mut next = Vec::new();
                for node in &contexts {
                    next.extend(self.select(documents, *node, &segment.xpath)?);
                }
                if !segment.host_checks.is_empty() {
                    next = self.filter_same_name(documents, next, &segment.host_checks)?;
                }
                contexts = host::document_order(documents.xot(), next);
            }
            found.extend(contexts);
        }

        debug!("host-filtered query {} -> {} nodes", query, found.len());
        Ok(host::document_order(documents.xot(), found))
    }

    /// Keep the nodes passing every same-name check. The sibling axes come
    /// from the engine; names are compared here.
    fn filter_same_name(
        &self,
        documents: &mut Documents,
        nodes: Vec<Node>,
        checks: &[SiblingCheck],
    ) -> Result<Vec<Node>, XPathError> {
        let start = Instant::now();
        let mut kept = Vec::with_capacity(nodes.len());

        for node in nodes {
            let preceding = self.select(documents, node, PRECEDING_SIBLINGS)?;
            let following = self.select(documents, node, FOLLOWING_SIBLINGS)?;
            let xot = documents.xot();
            let before = host::same_name_count(xot, node, &preceding);
            let after = host::same_name_count(xot, node, &following);
            if checks.iter().all(|check| check.matches(before, after)) {
                kept.push(node);
            }
        }

        TIMING_HOST_FILTER.fetch_add(elapsed_micros(start), Ordering::Relaxed);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse;

    fn load(xml: &str) -> (Documents, Node) {
        let mut documents = Documents::new();
        let root = XPathEngine::new().load(&mut documents, xml).unwrap();
        (documents, root)
    }

    #[test]
    fn test_select_nodes() {
        let (mut documents, root) = load("<root><item>a</item><item>b</item></root>");
        let engine = XPathEngine::new();
        let nodes = engine.select(&mut documents, root, "//item").unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_evaluate_atomics_and_nodes() {
        let (mut documents, root) = load("<root><item n='1'>a</item><item n='2'>b</item></root>");
        let engine = XPathEngine::new();
        assert_eq!(engine.evaluate(&mut documents, root, "count(//item)").unwrap(), vec!["2"]);
        assert_eq!(engine.evaluate(&mut documents, root, "//item").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_compile_error() {
        let (mut documents, root) = load("<root/>");
        let engine = XPathEngine::new();
        assert!(matches!(
            engine.select(&mut documents, root, "//["),
            Err(XPathError::Compile(_))
        ));
    }

    #[test]
    fn test_xml_parse_error() {
        let mut documents = Documents::new();
        assert!(matches!(
            XPathEngine::new().load(&mut documents, "<unclosed>"),
            Err(XPathError::XmlParse(_))
        ));
    }

    #[test]
    fn test_select_query_with_host_filter() {
        let (mut documents, root) = load("<r><p/><a/><p/><a/><p/></r>");
        let engine = XPathEngine::new();
        let query = parse(":first-of-type").unwrap();
        assert!(!query.is_plain());

        let nodes = engine.select_query(&mut documents, root, &query).unwrap();
        let xot = documents.xot();
        let names: Vec<String> = nodes
            .iter()
            .map(|n| xot.local_name_str(xot.element(*n).unwrap().name()).to_string())
            .collect();
        // <r> itself is the first (and only) <r>
        assert_eq!(names, vec!["r", "p", "a"]);
    }
}
