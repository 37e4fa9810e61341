//! CSS selector to XPath 1.0 compiler
//!
//! Supported syntax:
//! - tags, `*`, `#id`, `.class`
//! - attributes: `[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, with an
//!   optional trailing ` i` for case-insensitive values
//! - `:first-child`, `:last-child`, `:only-child`, their `-of-type`
//!   variants, `:nth-child()`, `:nth-last-child()`, `:nth-of-type()`,
//!   `:nth-last-of-type()`
//! - combinators: descendant (whitespace or `>>`), `>`, `+`, `~`, and `,`
//!
//! A selector that starts with a combinator (`> li`) is relative to the
//! evaluation context instead of searching the context's whole subtree.

mod compiler;
mod literal;
mod nth;
mod pseudo;
mod query;
pub(crate) mod recognizers;

pub use compiler::{compile, parse};
pub use literal::{escape_literal, CaseFold};
pub use nth::NthFormula;
pub use pseudo::{SiblingCheck, SiblingTest, EXTENSION_NAMESPACE, EXTENSION_PREFIX};
pub use query::{Alternative, Combinator, Compound, Predicate, Query, Segment, Step, ANCHOR};

use thiserror::Error;

/// Errors that can occur while compiling a selector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Unsupported selector at offset {position}: «{remainder}»")]
    Syntax { position: usize, remainder: String },
    #[error("Unsupported attribute operator «{operator}» on [{attribute}]")]
    UnsupportedOperator { operator: String, attribute: String },
    #[error("Unsupported pseudo-class «:{name}»")]
    UnsupportedPseudoClass { name: String },
    #[error("Invalid nth expression «{argument}»")]
    InvalidNth { argument: String },
    #[error("Empty selector")]
    Empty,
}

/// A selector together with its parsed query and serialized XPath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSelector {
    selector: String,
    query: Query,
    xpath: String,
}

impl CompiledSelector {
    /// Parse and serialize `selector`
    pub fn new(selector: &str) -> Result<Self, SelectorError> {
        let query = parse(selector)?;
        let xpath = query.to_string();
        Ok(CompiledSelector { selector: selector.to_string(), query, xpath })
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The XPath 1.0 expression; may call the same-name extension functions
    /// when `-of-type` is used without a tag (see [`Query::is_plain`])
    pub fn xpath(&self) -> &str {
        &self.xpath
    }
}
