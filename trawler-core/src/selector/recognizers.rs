//! Match-or-decline recognizers for each selector token
//!
//! Every recognizer looks at the start of the remaining selector. On a
//! match it records the token in the [`Query`] and returns the number of
//! bytes consumed; otherwise it returns `Ok(None)` and leaves the query
//! untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::literal::{escape_literal, CaseFold};
use super::pseudo::pseudo_class;
use super::query::{Combinator, Compound, Predicate, Query};
use super::SelectorError;

pub(crate) type Recognized = Result<Option<usize>, SelectorError>;

/// Signature shared by all recognizers
pub(crate) type Recognizer = fn(&str, &mut Query) -> Recognized;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\*|[\w-]+)").unwrap());
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#([\w-]+)").unwrap());
static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.([\w-]+)").unwrap());
// `~=` and `|=` are accepted here and rejected afterwards
static ATTRIBUTE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w-]+$").unwrap());
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)^\[
        \s*([\w-]+)\s*                                   # name
        (?:
            ([~|^$*]?=)\s*                               # operator
            (?:"([^"]*)"|'([^']*)'|([^\s\]"']+))         # value
            (?:\s*([iI]))?                               # case-insensitivity flag
            \s*
        )?
        \]"#,
    )
    .unwrap()
});
static PSEUDO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([\w-]+)(?:\(([^)]*)\))?").unwrap());
static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*,\s*").unwrap());
static ADJACENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+\s*").unwrap());
static GENERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*~\s*").unwrap());
static CHILD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(>+)\s*").unwrap());
static DESCENDANT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\s*>>\s*|\s+)").unwrap());

/// Recognizers in priority order. Whitespace around `,`, `+`, `~` and `>`
/// belongs to those tokens, so the bare-whitespace descendant comes last.
pub(crate) const RECOGNIZERS: &[(&str, Recognizer)] = &[
    ("tag", tag),
    ("id", id),
    ("class", class),
    ("attribute", attribute),
    ("pseudo-class", pseudo),
    ("comma", comma),
    ("adjacent-sibling", adjacent_sibling),
    ("general-sibling", general_sibling),
    ("child", child),
    ("descendant", descendant),
];

fn matched_len(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

fn tag(selector: &str, query: &mut Query) -> Recognized {
    let Some(m) = TAG_RE.find(selector) else {
        return Ok(None);
    };
    query.add_predicate(Compound::tag(m.as_str()));
    Ok(Some(m.end()))
}

fn id(selector: &str, query: &mut Query) -> Recognized {
    let Some(caps) = ID_RE.captures(selector) else {
        return Ok(None);
    };
    let expr = format!("@id={}", escape_literal(&caps[1]));
    query.add_predicate(Compound::with_predicate(Predicate::Expr(expr)));
    Ok(Some(matched_len(&caps)))
}

fn class(selector: &str, query: &mut Query) -> Recognized {
    let Some(caps) = CLASS_RE.captures(selector) else {
        return Ok(None);
    };
    let needle = escape_literal(&format!(" {} ", &caps[1]));
    let expr = format!("contains(concat(' ', normalize-space(@class), ' '), {needle})");
    query.add_predicate(Compound::with_predicate(Predicate::Expr(expr)));
    Ok(Some(matched_len(&caps)))
}

fn attribute(selector: &str, query: &mut Query) -> Recognized {
    let Some(caps) = ATTRIBUTE_RE.captures(selector) else {
        return Ok(None);
    };
    let name = &caps[1];
    let attr = format!("@{name}");

    let expr = match caps.get(2).map(|m| m.as_str()) {
        None => attr,
        Some(operator) => {
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .or_else(|| caps.get(5))
                .map_or("", |m| m.as_str());
            let ignore_case = caps.get(6).is_some();
            attribute_comparison(name, &attr, operator, value, ignore_case)?
        }
    };

    query.add_predicate(Compound::with_predicate(Predicate::Expr(expr)));
    Ok(Some(matched_len(&caps)))
}

/// Whether `name` is a bare attribute name as accepted inside `[...]`
pub(crate) fn is_attribute_name(name: &str) -> bool {
    ATTRIBUTE_NAME_RE.is_match(name)
}

fn attribute_comparison(
    name: &str,
    attr: &str,
    operator: &str,
    value: &str,
    ignore_case: bool,
) -> Result<String, SelectorError> {
    let (subject, value) = if ignore_case {
        let fold = CaseFold::from_value(value);
        (fold.apply(attr), fold.fold(value))
    } else {
        (attr.to_string(), value.to_string())
    };
    let literal = escape_literal(&value);

    let expr = match operator {
        "=" => format!("{subject}={literal}"),
        "^=" => format!("starts-with({subject}, {literal})"),
        "$=" => format!(
            "substring({subject}, string-length({subject}) - string-length({literal}) + 1) = {literal}"
        ),
        "*=" => format!("contains({subject}, {literal})"),
        unsupported => {
            return Err(SelectorError::UnsupportedOperator {
                operator: unsupported.to_string(),
                attribute: name.to_string(),
            })
        }
    };
    Ok(expr)
}

fn pseudo(selector: &str, query: &mut Query) -> Recognized {
    let Some(caps) = PSEUDO_RE.captures(selector) else {
        return Ok(None);
    };
    let predicate = pseudo_class(&caps[1], caps.get(2).map(|m| m.as_str()))?;
    query.add_predicate(Compound::with_predicate(predicate));
    Ok(Some(matched_len(&caps)))
}

fn comma(selector: &str, query: &mut Query) -> Recognized {
    let Some(m) = COMMA_RE.find(selector) else {
        return Ok(None);
    };
    query.next_alternative();
    Ok(Some(m.end()))
}

fn combinator(re: &Regex, selector: &str, query: &mut Query, combinator: Combinator) -> Recognized {
    let Some(m) = re.find(selector) else {
        return Ok(None);
    };
    query.add_combinator(combinator);
    Ok(Some(m.end()))
}

fn adjacent_sibling(selector: &str, query: &mut Query) -> Recognized {
    combinator(&ADJACENT_RE, selector, query, Combinator::Adjacent)
}

fn general_sibling(selector: &str, query: &mut Query) -> Recognized {
    combinator(&GENERAL_RE, selector, query, Combinator::General)
}

fn child(selector: &str, query: &mut Query) -> Recognized {
    // `>>` is the descendant combinator
    let Some(caps) = CHILD_RE.captures(selector) else {
        return Ok(None);
    };
    if caps[1].len() != 1 {
        return Ok(None);
    }
    query.add_combinator(Combinator::Child);
    Ok(Some(matched_len(&caps)))
}

fn descendant(selector: &str, query: &mut Query) -> Recognized {
    combinator(&DESCENDANT_RE, selector, query, Combinator::Descendant)
}
