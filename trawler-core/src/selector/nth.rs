//! `an+b` formulas for the `nth-*` pseudo-classes

use once_cell::sync::Lazy;
use regex::Regex;

use super::SelectorError;

static FORMULA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?\d*)n(?:([+-])(\d+))?$").unwrap());
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());

/// The positions `{a*n + b : n >= 0}` accepted by an `nth-*` pseudo-class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthFormula {
    pub a: i64,
    pub b: i64,
}

impl NthFormula {
    pub const fn new(a: i64, b: i64) -> Self {
        NthFormula { a, b }
    }

    /// Parse the argument of `:nth-child(...)` and friends.
    ///
    /// Accepts `odd`, `even`, `N`, `aN`, `aN+b` and `aN-b`. Whitespace is
    /// ignored; the keywords and `n` are case-insensitive.
    pub fn parse(argument: &str) -> Result<Self, SelectorError> {
        let compact: String = argument
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || SelectorError::InvalidNth { argument: argument.to_string() };

        match compact.as_str() {
            "odd" => return Ok(NthFormula::new(2, 1)),
            "even" => return Ok(NthFormula::new(2, 0)),
            _ => {}
        }

        if INTEGER_RE.is_match(&compact) {
            let b = compact.parse::<i64>().map_err(|_| invalid())?;
            return Ok(NthFormula::new(0, b));
        }

        let caps = FORMULA_RE.captures(&compact).ok_or_else(invalid)?;
        let a = match &caps[1] {
            "" | "+" => 1,
            "-" => -1,
            digits => digits.parse::<i64>().map_err(|_| invalid())?,
        };
        let b = match (caps.get(2), caps.get(3)) {
            (Some(sign), Some(digits)) => {
                let magnitude = digits.as_str().parse::<i64>().map_err(|_| invalid())?;
                if sign.as_str() == "-" { -magnitude } else { magnitude }
            }
            _ => 0,
        };

        Ok(NthFormula::new(a, b))
    }

    /// Whether the 1-based `position` belongs to the formula's set
    pub fn matches(&self, position: i64) -> bool {
        let NthFormula { a, b } = *self;
        if a == 0 {
            return position == b;
        }
        if b == 0 {
            return a > 0 && position % a == 0;
        }
        // Widened so extreme `b` values can't overflow
        let offset = i128::from(position) - i128::from(b);
        offset % i128::from(a) == 0 && if a > 0 { offset >= 0 } else { offset <= 0 }
    }

    /// XPath 1.0 predicate equivalent to [`NthFormula::matches`], given an
    /// expression counting the siblings before the context node.
    ///
    /// The position is `count + 1`.
    pub fn to_xpath(&self, count: &str) -> String {
        let NthFormula { a, b } = *self;
        if a == 0 {
            return format!("{} = {}", count, i128::from(b) - 1);
        }
        if b == 0 {
            if a < 0 {
                // No positive position is a multiple of a negative step
                return "false()".to_string();
            }
            return format!("({} + 1) mod {} = 0", count, a);
        }

        let offset = shifted(count, 1 - i128::from(b));
        let sign = if a > 0 { ">=" } else { "<=" };
        format!("({offset}) mod {a} = 0 and {offset} {sign} 0")
    }
}

// `count + delta` without emitting `+ -3`
fn shifted(count: &str, delta: i128) -> String {
    match delta {
        0 => count.to_string(),
        d if d > 0 => format!("{} + {}", count, d),
        d => format!("{} - {}", count, -d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> (i64, i64) {
        let f = NthFormula::parse(s).unwrap();
        (f.a, f.b)
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse("odd"), (2, 1));
        assert_eq!(parse("EVEN"), (2, 0));
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse("3"), (0, 3));
        assert_eq!(parse("+4"), (0, 4));
        assert_eq!(parse("-2"), (0, -2));
    }

    #[test]
    fn test_parse_formulas() {
        assert_eq!(parse("n"), (1, 0));
        assert_eq!(parse("+n"), (1, 0));
        assert_eq!(parse("-n+3"), (-1, 3));
        assert_eq!(parse("2n+1"), (2, 1));
        assert_eq!(parse(" 3n - 2 "), (3, -2));
        assert_eq!(parse("0n+0"), (0, 0));
        assert_eq!(parse("-1n"), (-1, 0));
        assert_eq!(parse("4N"), (4, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "n+", "2n+-1", "x", "2n1", "odd1", "--n"] {
            assert!(
                matches!(NthFormula::parse(bad), Err(SelectorError::InvalidNth { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_matches_exact_position() {
        let f = NthFormula::new(0, 2);
        let hits: Vec<i64> = (1..=5).filter(|p| f.matches(*p)).collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn test_matches_zero_and_negative_step_select_nothing() {
        assert!((1..=20).all(|p| !NthFormula::new(0, 0).matches(p)));
        assert!((1..=20).all(|p| !NthFormula::new(-1, 0).matches(p)));
    }

    #[test]
    fn test_matches_progressions() {
        let odd: Vec<i64> = (1..=7).filter(|p| NthFormula::new(2, 1).matches(*p)).collect();
        assert_eq!(odd, vec![1, 3, 5, 7]);

        let first_three: Vec<i64> = (1..=7).filter(|p| NthFormula::new(-1, 3).matches(*p)).collect();
        assert_eq!(first_three, vec![1, 2, 3]);

        let from_two: Vec<i64> = (1..=7).filter(|p| NthFormula::new(3, -1).matches(*p)).collect();
        assert_eq!(from_two, vec![2, 5]);
    }

    #[test]
    fn test_to_xpath() {
        let count = "count(preceding-sibling::*)";
        assert_eq!(NthFormula::new(0, 2).to_xpath(count), "count(preceding-sibling::*) = 1");
        assert_eq!(
            NthFormula::new(2, 0).to_xpath(count),
            "(count(preceding-sibling::*) + 1) mod 2 = 0"
        );
        assert_eq!(NthFormula::new(-1, 0).to_xpath(count), "false()");
        assert_eq!(
            NthFormula::new(2, 1).to_xpath(count),
            "(count(preceding-sibling::*)) mod 2 = 0 and count(preceding-sibling::*) >= 0"
        );
        assert_eq!(
            NthFormula::new(-1, 3).to_xpath(count),
            "(count(preceding-sibling::*) - 2) mod -1 = 0 and count(preceding-sibling::*) - 2 <= 0"
        );
        assert_eq!(
            NthFormula::new(3, -1).to_xpath(count),
            "(count(preceding-sibling::*) + 2) mod 3 = 0 and count(preceding-sibling::*) + 2 >= 0"
        );
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        let count = "count(preceding-sibling::*)";

        let min = NthFormula::parse("-9223372036854775808").unwrap();
        assert_eq!(min, NthFormula::new(0, i64::MIN));
        assert_eq!(min.to_xpath(count), "count(preceding-sibling::*) = -9223372036854775809");
        assert!(!min.matches(1));

        let far = NthFormula::parse("n-9223372036854775807").unwrap();
        assert_eq!(
            far.to_xpath(count),
            "(count(preceding-sibling::*) + 9223372036854775808) mod 1 = 0 \
             and count(preceding-sibling::*) + 9223372036854775808 >= 0"
        );
        assert!(far.matches(2));
        assert!(far.matches(i64::MAX));

        let backwards = NthFormula::parse("-n-9223372036854775807").unwrap();
        assert!(!backwards.matches(1));
        assert!(backwards.matches(i64::MIN + 1));
    }
}
