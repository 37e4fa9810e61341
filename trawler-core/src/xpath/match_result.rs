//! Match result types for selector queries

use serde::Serialize;

/// A single node matched in one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// File the match was found in (`<stdin>` for piped input)
    pub file: String,
    /// Absolute location path of the node, e.g. `/html[1]/body[1]/p[2]`
    pub path: String,
    /// Text content of the node, or the requested attribute value
    pub value: String,
    /// Serialized XML of the node
    #[serde(skip)]
    pub xml_fragment: Option<String>,
}

impl Match {
    /// Create a new match with minimal information
    pub fn new(file: String, value: String) -> Self {
        Match { file, path: String::new(), value, xml_fragment: None }
    }

    pub fn with_path(mut self, path: String) -> Self {
        self.path = path;
        self
    }

    /// Set the XML fragment for this match
    pub fn with_xml_fragment(mut self, xml: String) -> Self {
        self.xml_fragment = Some(xml);
        self
    }
}
