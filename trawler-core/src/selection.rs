//! Fluent node collections over a [`Document`]

use std::fmt;

use serde::Serialize;
use xot::Node;

use crate::document::{Document, TrawlerError};
use crate::selector::{recognizers, SelectorError};
use crate::xpath::{host, Match};

/// Result of [`Selection::evaluate`] and [`Selection::attr`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Values {
    /// From a single-node selection; `None` when the selection is empty
    Single(Option<String>),
    /// One value per node, in selection order
    Many(Vec<String>),
}

impl Values {
    /// Flatten into a list; an empty single selection yields nothing
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Values::Single(value) => value.into_iter().collect(),
            Values::Many(values) => values,
        }
    }

    /// The single value, if this came from a single-node selection
    pub fn single(&self) -> Option<&str> {
        match self {
            Values::Single(value) => value.as_deref(),
            Values::Many(_) => None,
        }
    }
}

/// An ordered list of nodes from one document
///
/// Selections are cheap to create; every transforming method returns a new
/// one. A selection built by [`item`](Self::item), [`first`](Self::first),
/// iteration or [`Document::root`] is *single*: [`evaluate`](Self::evaluate)
/// and [`attr`](Self::attr) then return one value instead of a list.
#[derive(Clone)]
pub struct Selection<'d> {
    document: &'d Document,
    nodes: Vec<Node>,
    single: bool,
}

impl<'d> Selection<'d> {
    pub(crate) fn new(document: &'d Document, nodes: Vec<Node>, single: bool) -> Self {
        Selection { document, nodes, single }
    }

    fn sub(&self, nodes: Vec<Node>, single: bool) -> Self {
        Selection::new(self.document, nodes, single)
    }

    // Transforming methods

    /// Run a CSS selector from every node and concatenate the results.
    ///
    /// Nodes reached from several contexts appear several times; use
    /// [`unique`](Self::unique) to drop them.
    pub fn select(&self, selector: &str) -> Result<Selection<'d>, TrawlerError> {
        let compiled = self.document.cache().get_or_compile(selector)?;
        let engine = self.document.engine();
        let mut documents = self.document.documents().borrow_mut();

        let mut found = Vec::new();
        for node in &self.nodes {
            found.extend(engine.select_query(&mut documents, *node, compiled.query())?);
        }
        Ok(self.sub(found, false))
    }

    /// Run a raw XPath expression from every node and concatenate the
    /// resulting nodes
    pub fn query(&self, xpath: &str) -> Result<Selection<'d>, TrawlerError> {
        let engine = self.document.engine();
        let mut documents = self.document.documents().borrow_mut();

        let mut found = Vec::new();
        for node in &self.nodes {
            found.extend(engine.select(&mut documents, *node, xpath)?);
        }
        Ok(self.sub(found, false))
    }

    /// Single selection of the node at `index` (empty when out of range)
    pub fn item(&self, index: usize) -> Selection<'d> {
        self.sub(self.node(index).into_iter().collect(), true)
    }

    pub fn first(&self) -> Selection<'d> {
        self.item(0)
    }

    /// Drop repeated nodes, keeping the first occurrence of each
    pub fn unique(&self) -> Selection<'d> {
        let mut seen = std::collections::HashSet::new();
        let nodes = self.nodes.iter().copied().filter(|node| seen.insert(*node)).collect();
        self.sub(nodes, self.single)
    }

    /// All child nodes (text included) of every node
    pub fn children(&self) -> Selection<'d> {
        let documents = self.document.documents().borrow();
        let xot = documents.xot();
        let nodes = self.nodes.iter().flat_map(|node| xot.children(*node)).collect();
        self.sub(nodes, false)
    }

    /// Parent of every node; the document node has none and is dropped
    pub fn parent(&self) -> Selection<'d> {
        let documents = self.document.documents().borrow();
        let xot = documents.xot();
        let nodes = self.nodes.iter().filter_map(|node| xot.parent(*node)).collect();
        self.sub(nodes, self.single)
    }

    // Extracting data

    pub fn node(&self, index: usize) -> Option<Node> {
        self.nodes.get(index).copied()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// Single selections of each node in turn
    pub fn iter(&self) -> impl Iterator<Item = Selection<'d>> + '_ {
        self.nodes.iter().map(move |node| self.sub(vec![*node], true))
    }

    /// Concatenated string values of all nodes
    pub fn text(&self) -> String {
        let documents = self.document.documents().borrow();
        let xot = documents.xot();
        self.nodes.iter().map(|node| xot.string_value(*node)).collect()
    }

    /// Concatenated XML serialization of all nodes
    pub fn xml(&self) -> String {
        let documents = self.document.documents().borrow();
        let xot = documents.xot();
        self.nodes
            .iter()
            .map(|node| xot.to_string(*node).unwrap_or_default())
            .collect()
    }

    /// Evaluate `expr` with each node as context.
    ///
    /// A node's value is the string value of the first item the expression
    /// yields, or the empty string if it yields nothing.
    pub fn evaluate(&self, expr: &str) -> Result<Values, TrawlerError> {
        let engine = self.document.engine();
        let mut documents = self.document.documents().borrow_mut();

        if self.single {
            return match self.nodes.first() {
                None => Ok(Values::Single(None)),
                Some(node) => {
                    let values = engine.evaluate(&mut documents, *node, expr)?;
                    Ok(Values::Single(Some(values.into_iter().next().unwrap_or_default())))
                }
            };
        }

        let mut values = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = engine.evaluate(&mut documents, *node, expr)?;
            values.push(value.into_iter().next().unwrap_or_default());
        }
        Ok(Values::Many(values))
    }

    /// Value of attribute `name` on each node; missing attributes are empty
    pub fn attr(&self, name: &str) -> Result<Values, TrawlerError> {
        if !recognizers::is_attribute_name(name) {
            return Err(SelectorError::Syntax { position: 0, remainder: name.to_string() }.into());
        }
        self.evaluate(&format!("string(@{name})"))
    }

    /// Nodes sorted into document order without duplicates
    pub fn in_document_order(&self) -> Selection<'d> {
        let documents = self.document.documents().borrow();
        let nodes = host::document_order(documents.xot(), self.nodes.clone());
        self.sub(nodes, self.single)
    }

    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// One [`Match`] per node, for output formatting. With `attr`, the
    /// match value is that attribute and no XML fragment is kept.
    pub fn to_matches(&self, file: &str, attr: Option<&str>) -> Result<Vec<Match>, TrawlerError> {
        let mut matches = Vec::with_capacity(self.nodes.len());
        for (item, node) in self.iter().zip(&self.nodes) {
            let value = match attr {
                Some(name) => Some(item.attr(name)?.into_vec().concat()),
                None => None,
            };

            let documents = self.document.documents().borrow();
            let xot = documents.xot();
            let m = match value {
                Some(value) => Match::new(file.to_string(), value),
                None => Match::new(file.to_string(), xot.string_value(*node))
                    .with_xml_fragment(xot.to_string(*node).unwrap_or_default()),
            };
            matches.push(m.with_path(host::location_path(xot, *node)));
        }
        Ok(matches)
    }
}

impl<'a, 'd> IntoIterator for &'a Selection<'d> {
    type Item = Selection<'d>;
    type IntoIter = Box<dyn Iterator<Item = Selection<'d>> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl fmt::Display for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("len", &self.nodes.len())
            .field("single", &self.single)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, TrawlerError};
    use crate::selector::SelectorError;

    const XML: &str = "<root><a id='1'>x</a><b><a id='2'>y</a></b></root>";

    #[test]
    fn test_select_is_not_single() {
        let doc = Document::from_xml(XML).unwrap();
        let found = doc.select("a").unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.is_single());
        assert!(found.first().is_single());
    }

    #[test]
    fn test_item_out_of_range_is_empty() {
        let doc = Document::from_xml(XML).unwrap();
        let item = doc.select("a").unwrap().item(5);
        assert!(item.is_empty());
        assert_eq!(item.attr("id").unwrap(), super::Values::Single(None));
    }

    #[test]
    fn test_duplicates_and_unique() {
        let doc = Document::from_xml(XML).unwrap();
        let found = doc.select("root, b").unwrap().select("a").unwrap();
        // <a id='2'> is reached from both <root> and <b>
        assert_eq!(found.len(), 3);
        assert_eq!(found.unique().len(), 2);
        assert_eq!(found.unique().text(), "xy");
    }

    #[test]
    fn test_attr_rejects_non_names() {
        let doc = Document::from_xml(XML).unwrap();
        let found = doc.select("a").unwrap();
        for name in ["x) or (1", "data attr", "", "@id"] {
            assert!(
                matches!(found.attr(name), Err(TrawlerError::Selector(SelectorError::Syntax { .. }))),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(found.attr("data-x").unwrap().into_vec(), vec!["", ""]);
    }

    #[test]
    fn test_parent_and_children() {
        let doc = Document::from_xml(XML).unwrap();
        let b = doc.select("b").unwrap();
        assert_eq!(b.children().len(), 1);
        assert_eq!(b.parent().attr("id").unwrap().into_vec(), vec![""]);
        assert!(doc.root().parent().is_empty());
    }

    #[test]
    fn test_xml_and_display() {
        let doc = Document::from_xml(XML).unwrap();
        let a = doc.select("b > a").unwrap();
        assert_eq!(a.xml(), r#"<a id="2">y</a>"#);
        assert_eq!(a.to_string(), "y");
    }

    #[test]
    fn test_in_document_order() {
        let doc = Document::from_xml(XML).unwrap();
        // root, a, b, a from <root> followed by b, a from <b>
        let found = doc.select("root, b").unwrap().select("*").unwrap();
        assert_eq!(found.len(), 6);
        let ordered = found.in_document_order();
        assert_eq!(ordered.attr("id").unwrap().into_vec(), vec!["", "1", "", "2"]);
    }

    #[test]
    fn test_to_matches() {
        let doc = Document::from_xml(XML).unwrap();
        let found = doc.select("a").unwrap();

        let matches = found.to_matches("in.xml", None).unwrap();
        assert_eq!(matches[1].path, "/root[1]/b[1]/a[1]");
        assert_eq!(matches[1].value, "y");
        assert_eq!(matches[1].xml_fragment.as_deref(), Some(r#"<a id="2">y</a>"#));

        let ids = found.to_matches("in.xml", Some("id")).unwrap();
        assert_eq!(ids[0].value, "1");
        assert_eq!(ids[0].xml_fragment, None);
    }
}
