//! Path/alternative accumulator
//!
//! Recognizers feed compound steps and combinators into a [`Query`]; the
//! query owns the alternatives and serializes them to one XPath expression.
//! It knows nothing about selector syntax.

use std::fmt;

use super::pseudo::{SiblingCheck, SiblingTest};

/// Implicit first step of an alternative: search the whole subtree
pub const ANCHOR: &str = "descendant-or-self::*";

/// Relationship between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b` or `a >> b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    Adjacent,
    /// `a ~ b`
    General,
}

impl Combinator {
    pub fn axis_step(self) -> &'static str {
        match self {
            Combinator::Descendant => "descendant::*",
            Combinator::Child => "child::*",
            Combinator::Adjacent => "following-sibling::*[1]",
            Combinator::General => "following-sibling::*",
        }
    }
}

/// One bracketed condition of a compound step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// XPath 1.0 boolean expression evaluated on the element itself
    Expr(String),
    /// Sibling check restricted to siblings with the element's own name
    SameName(SiblingCheck),
}

/// A `self::` step: a tag test followed by chained predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub tag: String,
    pub predicates: Vec<Predicate>,
}

impl Compound {
    /// `self::tag`
    pub fn tag(tag: &str) -> Self {
        Compound { tag: tag.to_string(), predicates: Vec::new() }
    }

    /// `self::*[predicate]`
    pub fn with_predicate(predicate: Predicate) -> Self {
        Compound { tag: "*".to_string(), predicates: vec![predicate] }
    }

    fn is_universal(&self) -> bool {
        self.tag == "*"
    }

    /// Fold `other` into this step if both can describe the same element
    fn narrow(&mut self, other: Compound) -> Result<(), Compound> {
        if !(other.is_universal() || self.is_universal() || self.tag == other.tag) {
            return Err(other);
        }
        if !other.is_universal() {
            self.tag = other.tag;
        }
        self.predicates.extend(other.predicates);
        Ok(())
    }

    fn sibling_test(&self) -> SiblingTest<'_> {
        if self.is_universal() {
            SiblingTest::SameName
        } else {
            SiblingTest::Named(&self.tag)
        }
    }

    /// Same-name checks that plain XPath 1.0 can't express for this step
    pub fn host_checks(&self) -> Vec<SiblingCheck> {
        if !self.is_universal() {
            return Vec::new();
        }
        self.predicates
            .iter()
            .filter_map(|p| match p {
                Predicate::SameName(check) => Some(*check),
                Predicate::Expr(_) => None,
            })
            .collect()
    }

    fn render(&self, include_host_checks: bool) -> String {
        let mut out = format!("self::{}", self.tag);
        for predicate in &self.predicates {
            let body = match predicate {
                Predicate::Expr(expr) => expr.clone(),
                Predicate::SameName(_) if self.is_universal() && !include_host_checks => continue,
                Predicate::SameName(check) => check.to_xpath(self.sibling_test()),
            };
            out.push('[');
            out.push_str(&body);
            out.push(']');
        }
        out
    }
}

/// One path step of an alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Anchor,
    Combinator(Combinator),
    Compound(Compound),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Anchor => f.write_str(ANCHOR),
            Step::Combinator(combinator) => f.write_str(combinator.axis_step()),
            Step::Compound(compound) => f.write_str(&compound.render(true)),
        }
    }
}

/// Part of an alternative that the XPath engine can run on its own,
/// optionally followed by same-name checks done by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Relative XPath 1.0 path (never contains extension calls)
    pub xpath: String,
    /// Checks every node produced by `xpath` must pass
    pub host_checks: Vec<SiblingCheck>,
}

/// One comma-separated branch of a selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alternative {
    steps: Vec<Step>,
}

impl Alternative {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether any step needs the evaluator's same-name capability
    pub fn needs_host(&self) -> bool {
        self.steps.iter().any(|step| match step {
            Step::Compound(compound) => !compound.host_checks().is_empty(),
            _ => false,
        })
    }

    /// Split the alternative at every step carrying host-side checks.
    ///
    /// Running the segments in order, each from the nodes surviving the
    /// previous one, selects the same nodes as the serialized expression.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for step in &self.steps {
            match step {
                Step::Compound(compound) => {
                    pending.push(compound.render(false));
                    let host_checks = compound.host_checks();
                    if !host_checks.is_empty() {
                        segments.push(Segment { xpath: pending.join("/"), host_checks });
                        pending.clear();
                    }
                }
                other => pending.push(other.to_string()),
            }
        }
        if !pending.is_empty() {
            segments.push(Segment { xpath: pending.join("/"), host_checks: Vec::new() });
        }

        segments
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Ordered alternatives of one compiled selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    alternatives: Vec<Alternative>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Query { alternatives: vec![Alternative::default()] }
    }

    fn current(&mut self) -> &mut Alternative {
        if self.alternatives.is_empty() {
            self.alternatives.push(Alternative::default());
        }
        let last = self.alternatives.len() - 1;
        &mut self.alternatives[last]
    }

    /// Narrow the current element, anchoring an empty alternative first
    pub fn add_predicate(&mut self, compound: Compound) {
        let current = self.current();
        if current.steps.is_empty() {
            current.steps.push(Step::Anchor);
        }
        let compound = match current.steps.last_mut() {
            Some(Step::Compound(last)) => match last.narrow(compound) {
                Ok(()) => return,
                Err(compound) => compound,
            },
            _ => compound,
        };
        current.steps.push(Step::Compound(compound));
    }

    /// Navigate along a combinator axis; no anchor is inserted, so a
    /// leading combinator is relative to the evaluation context
    pub fn add_combinator(&mut self, combinator: Combinator) {
        self.current().steps.push(Step::Combinator(combinator));
    }

    /// Close the current alternative (even if empty) and open a new one
    pub fn next_alternative(&mut self) {
        self.alternatives.push(Alternative::default());
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// True when the serialized expression is plain XPath 1.0 that any
    /// engine can run in one go
    pub fn is_plain(&self) -> bool {
        self.alternatives.iter().all(|alt| !alt.is_empty() && !alt.needs_host())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", alternative)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::nth::NthFormula;

    fn class(name: &str) -> Compound {
        Compound::with_predicate(Predicate::Expr(format!("@class='{name}'")))
    }

    #[test]
    fn test_first_predicate_is_anchored() {
        let mut query = Query::new();
        query.add_predicate(Compound::tag("div"));
        assert_eq!(query.to_string(), "descendant-or-self::*/self::div");
    }

    #[test]
    fn test_predicates_chain_on_one_step() {
        let mut query = Query::new();
        query.add_predicate(Compound::tag("div"));
        query.add_predicate(class("a"));
        query.add_predicate(class("b"));
        assert_eq!(
            query.to_string(),
            "descendant-or-self::*/self::div[@class='a'][@class='b']"
        );
    }

    #[test]
    fn test_tag_replaces_universal_test() {
        let mut query = Query::new();
        query.add_predicate(class("a"));
        query.add_predicate(Compound::tag("p"));
        assert_eq!(query.to_string(), "descendant-or-self::*/self::p[@class='a']");
    }

    #[test]
    fn test_conflicting_tags_stay_separate() {
        let mut query = Query::new();
        query.add_predicate(Compound::tag("a"));
        query.add_predicate(Compound::tag("b"));
        assert_eq!(query.to_string(), "descendant-or-self::*/self::a/self::b");
    }

    #[test]
    fn test_leading_combinator_has_no_anchor() {
        let mut query = Query::new();
        query.add_combinator(Combinator::Child);
        query.add_predicate(Compound::tag("div"));
        assert_eq!(query.to_string(), "child::*/self::div");
    }

    #[test]
    fn test_alternatives_are_joined() {
        let mut query = Query::new();
        query.add_predicate(Compound::tag("a"));
        query.next_alternative();
        query.add_predicate(Compound::tag("b"));
        query.add_combinator(Combinator::Adjacent);
        query.add_predicate(Compound::tag("c"));
        assert_eq!(
            query.to_string(),
            "descendant-or-self::*/self::a|descendant-or-self::*/self::b/following-sibling::*[1]/self::c"
        );
    }

    #[test]
    fn test_empty_alternative_does_not_panic() {
        let mut query = Query::new();
        query.next_alternative();
        query.add_predicate(Compound::tag("a"));
        assert_eq!(query.to_string(), "|descendant-or-self::*/self::a");
        assert!(!query.is_plain());
    }

    #[test]
    fn test_named_of_type_is_plain_xpath() {
        let mut query = Query::new();
        query.add_predicate(Compound::tag("li"));
        query.add_predicate(Compound::with_predicate(Predicate::SameName(SiblingCheck::First)));
        assert_eq!(
            query.to_string(),
            "descendant-or-self::*/self::li[not(preceding-sibling::li)]"
        );
        assert!(query.is_plain());
    }

    #[test]
    fn test_universal_of_type_segments() {
        let mut query = Query::new();
        query.add_predicate(class("x"));
        let check = SiblingCheck::Nth { formula: NthFormula::new(0, 2), from_end: false };
        query.add_predicate(Compound::with_predicate(Predicate::SameName(check)));
        query.add_combinator(Combinator::Child);
        query.add_predicate(Compound::tag("b"));

        assert_eq!(
            query.to_string(),
            "descendant-or-self::*/self::*[@class='x'][trawl:same-name-count(preceding-sibling::*) = 1]/child::*/self::b"
        );
        assert!(!query.is_plain());

        let segments = query.alternatives()[0].segments();
        assert_eq!(
            segments,
            vec![
                Segment {
                    xpath: "descendant-or-self::*/self::*[@class='x']".to_string(),
                    host_checks: vec![check],
                },
                Segment { xpath: "child::*/self::b".to_string(), host_checks: Vec::new() },
            ]
        );
    }
}
