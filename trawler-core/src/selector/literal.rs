//! XPath 1.0 string literals and case folding
//!
//! XPath 1.0 has no escape sequence inside string literals: a literal is
//! delimited by `'` or `"` and cannot contain its own delimiter. Values
//! containing both quote characters are split into runs and glued back
//! together with `concat()`.

/// Render `value` as an XPath 1.0 expression that evaluates to `value`.
///
/// ```
/// use trawler_core::selector::escape_literal;
///
/// assert_eq!(escape_literal("plain"), "'plain'");
/// assert_eq!(escape_literal("it's"), "\"it's\"");
/// assert_eq!(escape_literal(r#"it's "x""#), r#"concat("it's ", '"x"')"#);
/// ```
pub fn escape_literal(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }

    let mut fragments: Vec<String> = Vec::new();
    let mut run = String::new();
    // Delimiter of the open run; decided by the first quote the run contains
    let mut delimiter: Option<char> = None;

    for ch in value.chars() {
        if ch == '\'' || ch == '"' {
            if delimiter == Some(ch) {
                fragments.push(quote(&run, ch));
                run.clear();
                delimiter = None;
            }
            if delimiter.is_none() {
                delimiter = Some(other_quote(ch));
            }
        }
        run.push(ch);
    }
    fragments.push(quote(&run, delimiter.unwrap_or('\'')));

    if fragments.len() == 1 {
        fragments.remove(0)
    } else {
        format!("concat({})", fragments.join(", "))
    }
}

fn other_quote(quote: char) -> char {
    if quote == '\'' { '"' } else { '\'' }
}

fn quote(run: &str, delimiter: char) -> String {
    format!("{delimiter}{run}{delimiter}")
}

/// Upper-to-lower mapping for the characters of one attribute value.
///
/// Only characters that actually appear in the value need folding: any
/// other attribute character can never match the value anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFold {
    upper: String,
    lower: String,
}

impl CaseFold {
    /// Build the table from the cased characters of `value`
    pub fn from_value(value: &str) -> Self {
        let mut fold = CaseFold::default();

        for ch in value.chars() {
            let (Some(upper), Some(lower)) = (single(ch.to_uppercase()), single(ch.to_lowercase())) else {
                continue;
            };
            if upper == lower || fold.upper.contains(upper) {
                continue;
            }
            fold.upper.push(upper);
            fold.lower.push(lower);
        }

        fold
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    /// Characters replaced by `translate()`
    pub fn upper(&self) -> &str {
        &self.upper
    }

    /// Replacement characters, position for position with [`CaseFold::upper`]
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Lowercase `value` with the same mapping `translate()` applies
    pub fn fold(&self, value: &str) -> String {
        value
            .chars()
            .map(|ch| {
                self.upper
                    .chars()
                    .position(|upper| upper == ch)
                    .and_then(|index| self.lower.chars().nth(index))
                    .unwrap_or(ch)
            })
            .collect()
    }

    /// Wrap `expr` in a `translate()` call lowercasing the folded characters
    pub fn apply(&self, expr: &str) -> String {
        if self.is_empty() {
            return expr.to_string();
        }
        format!(
            "translate({}, {}, {})",
            expr,
            escape_literal(&self.upper),
            escape_literal(&self.lower)
        )
    }
}

// Case mappings that expand to several characters (e.g. 'ß' -> "SS") can't
// be expressed with translate()
fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    match chars.next() {
        Some(_) => None,
        None => Some(first),
    }
}
