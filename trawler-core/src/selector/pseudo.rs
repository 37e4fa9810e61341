//! Structural pseudo-classes
//!
//! `:first-child`, `:last-child`, `:only-child`, the `-of-type` variants and
//! the four `nth-*` forms. The plain forms are pure XPath 1.0 sibling
//! checks; the `-of-type` forms need to compare sibling names with the
//! context node's name, which XPath 1.0 can only do when the tag is known.

use super::nth::NthFormula;
use super::query::Predicate;
use super::SelectorError;

/// Prefix bound to [`EXTENSION_NAMESPACE`] in emitted expressions
pub const EXTENSION_PREFIX: &str = "trawl";

/// Namespace of the same-name sibling functions an evaluator must provide
/// for `-of-type` pseudo-classes on tag-less compounds
pub const EXTENSION_NAMESPACE: &str = "urn:trawler:functions";

/// A position check against the context node's element siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingCheck {
    /// No sibling before the node
    First,
    /// No sibling after the node
    Last,
    /// No sibling at all
    Only,
    /// Rank (counted from the start, or from the end) is in the formula's set
    Nth { formula: NthFormula, from_end: bool },
}

impl SiblingCheck {
    /// Evaluate the check given the number of relevant siblings before and
    /// after the node.
    pub fn matches(&self, preceding: usize, following: usize) -> bool {
        match self {
            SiblingCheck::First => preceding == 0,
            SiblingCheck::Last => following == 0,
            SiblingCheck::Only => preceding == 0 && following == 0,
            SiblingCheck::Nth { formula, from_end } => {
                let before = if *from_end { following } else { preceding };
                formula.matches(before as i64 + 1)
            }
        }
    }

    /// Render the check as an XPath predicate body
    pub fn to_xpath(&self, siblings: SiblingTest<'_>) -> String {
        const PRECEDING: &str = "preceding-sibling";
        const FOLLOWING: &str = "following-sibling";

        match self {
            SiblingCheck::First => format!("not({})", siblings.exists(PRECEDING)),
            SiblingCheck::Last => format!("not({})", siblings.exists(FOLLOWING)),
            SiblingCheck::Only => format!(
                "not({}) and not({})",
                siblings.exists(PRECEDING),
                siblings.exists(FOLLOWING)
            ),
            SiblingCheck::Nth { formula, from_end } => {
                let axis = if *from_end { FOLLOWING } else { PRECEDING };
                formula.to_xpath(&siblings.count(axis))
            }
        }
    }
}

/// Which siblings a [`SiblingCheck`] counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingTest<'a> {
    /// Every element sibling
    Any,
    /// Siblings with this tag name (an `-of-type` check on a known tag)
    Named(&'a str),
    /// Siblings sharing the context node's name, via the evaluator's
    /// extension functions
    SameName,
}

impl SiblingTest<'_> {
    fn exists(&self, axis: &str) -> String {
        match self {
            SiblingTest::Any => format!("{axis}::*"),
            SiblingTest::Named(tag) => format!("{axis}::{tag}"),
            SiblingTest::SameName => format!("{EXTENSION_PREFIX}:same-name-exists({axis}::*)"),
        }
    }

    fn count(&self, axis: &str) -> String {
        match self {
            SiblingTest::Any => format!("count({axis}::*)"),
            SiblingTest::Named(tag) => format!("count({axis}::{tag})"),
            SiblingTest::SameName => format!("{EXTENSION_PREFIX}:same-name-count({axis}::*)"),
        }
    }
}

/// Translate `:name` or `:name(argument)` into a predicate
pub(crate) fn pseudo_class(name: &str, argument: Option<&str>) -> Result<Predicate, SelectorError> {
    let unsupported = || SelectorError::UnsupportedPseudoClass { name: name.to_string() };

    let (check, of_type) = match (name.to_ascii_lowercase().as_str(), argument) {
        ("first-child", None) => (SiblingCheck::First, false),
        ("last-child", None) => (SiblingCheck::Last, false),
        ("only-child", None) => (SiblingCheck::Only, false),
        ("first-of-type", None) => (SiblingCheck::First, true),
        ("last-of-type", None) => (SiblingCheck::Last, true),
        ("only-of-type", None) => (SiblingCheck::Only, true),
        ("nth-child", argument) => (nth(argument, false)?, false),
        ("nth-last-child", argument) => (nth(argument, true)?, false),
        ("nth-of-type", argument) => (nth(argument, false)?, true),
        ("nth-last-of-type", argument) => (nth(argument, true)?, true),
        _ => return Err(unsupported()),
    };

    Ok(if of_type {
        Predicate::SameName(check)
    } else {
        Predicate::Expr(check.to_xpath(SiblingTest::Any))
    })
}

fn nth(argument: Option<&str>, from_end: bool) -> Result<SiblingCheck, SelectorError> {
    let formula = NthFormula::parse(argument.unwrap_or_default())?;
    Ok(SiblingCheck::Nth { formula, from_end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(name: &str, argument: Option<&str>) -> String {
        match pseudo_class(name, argument).unwrap() {
            Predicate::Expr(expr) => expr,
            other => panic!("expected plain expression, got {other:?}"),
        }
    }

    #[test]
    fn test_structural_child_checks() {
        assert_eq!(expr("first-child", None), "not(preceding-sibling::*)");
        assert_eq!(expr("last-child", None), "not(following-sibling::*)");
        assert_eq!(
            expr("only-child", None),
            "not(preceding-sibling::*) and not(following-sibling::*)"
        );
    }

    #[test]
    fn test_nth_last_counts_following_siblings() {
        assert_eq!(expr("nth-last-child", Some("1")), "count(following-sibling::*) = 0");
    }

    #[test]
    fn test_of_type_is_same_name_predicate() {
        assert_eq!(
            pseudo_class("first-of-type", None).unwrap(),
            Predicate::SameName(SiblingCheck::First)
        );
        assert_eq!(
            pseudo_class("nth-last-of-type", Some("2n")).unwrap(),
            Predicate::SameName(SiblingCheck::Nth {
                formula: NthFormula::new(2, 0),
                from_end: true
            })
        );
    }

    #[test]
    fn test_sibling_tests_render() {
        let check = SiblingCheck::Only;
        assert_eq!(
            check.to_xpath(SiblingTest::Named("li")),
            "not(preceding-sibling::li) and not(following-sibling::li)"
        );
        assert_eq!(
            SiblingCheck::Nth { formula: NthFormula::new(0, 1), from_end: false }
                .to_xpath(SiblingTest::SameName),
            "trawl:same-name-count(preceding-sibling::*) = 0"
        );
    }

    #[test]
    fn test_unsupported_pseudo_classes() {
        for (name, arg) in [("hover", None), ("not", Some(".a")), ("first-child", Some("2"))] {
            assert!(matches!(
                pseudo_class(name, arg),
                Err(SelectorError::UnsupportedPseudoClass { .. })
            ));
        }
    }

    #[test]
    fn test_nth_without_argument_is_invalid() {
        assert!(matches!(
            pseudo_class("nth-child", None),
            Err(SelectorError::InvalidNth { .. })
        ));
    }

    #[test]
    fn test_sibling_check_matches() {
        assert!(SiblingCheck::First.matches(0, 3));
        assert!(!SiblingCheck::Last.matches(0, 3));
        assert!(SiblingCheck::Only.matches(0, 0));
        let second_from_end = SiblingCheck::Nth { formula: NthFormula::new(0, 2), from_end: true };
        assert!(second_from_end.matches(5, 1));
        assert!(!second_from_end.matches(1, 5));
    }
}
