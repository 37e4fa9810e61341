//! Driver loop: feeds the selector through the recognizer chain

use log::{debug, trace};

use super::query::Query;
use super::recognizers::RECOGNIZERS;
use super::SelectorError;

/// Parse `selector` into a [`Query`].
///
/// Surrounding whitespace is ignored. At every position the recognizers are
/// tried in priority order; the first one that matches consumes its token.
/// If none matches, the whole compilation fails.
pub fn parse(selector: &str) -> Result<Query, SelectorError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut query = Query::new();
    let mut cursor = selector;

    'tokens: while !cursor.is_empty() {
        for (name, recognize) in RECOGNIZERS {
            if let Some(consumed) = recognize(cursor, &mut query)? {
                trace!("{} matched {:?}", name, &cursor[..consumed]);
                cursor = &cursor[consumed..];
                continue 'tokens;
            }
        }

        return Err(SelectorError::Syntax {
            position: selector.len() - cursor.len(),
            remainder: cursor.to_string(),
        });
    }

    Ok(query)
}

/// Compile `selector` to an XPath 1.0 expression
pub fn compile(selector: &str) -> Result<String, SelectorError> {
    let xpath = parse(selector)?.to_string();
    debug!("compiled selector {:?} -> {}", selector, xpath);
    Ok(xpath)
}
