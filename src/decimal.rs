//! Whole-cell decimal literal recognition.
//!
//! A cell such as `" -12.500 "` decomposes into an optional sign, the integer
//! digits and the fractional digits. The integer and fractional digit counts
//! drive decimal precision/scale inference; the sign and first integer digit
//! drive leading-zero detection.

use std::sync::OnceLock;

use regex::Regex;

static DECIMAL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn decimal_pattern() -> &'static Regex {
    DECIMAL_PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([-+])?(\d+)(?:\.(\d+))?\s*$").expect("decimal pattern compiles")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalParts<'a> {
    pub sign: Option<char>,
    pub integer_digits: &'a str,
    /// Digits after the decimal point, without the point itself.
    pub fraction_digits: Option<&'a str>,
}

impl DecimalParts<'_> {
    /// Total digit count: integer digits plus fractional digits.
    pub fn precision(&self) -> usize {
        self.integer_digits.chars().count() + self.scale()
    }

    pub fn scale(&self) -> usize {
        self.fraction_digits.map_or(0, |digits| digits.chars().count())
    }

    /// An unsigned integer part of two or more digits starting with `0`, the
    /// usual shape of a code (`007`, `0042.5`) rather than a quantity.
    pub fn has_leading_zero(&self) -> bool {
        self.sign.is_none()
            && self.integer_digits.chars().count() > 1
            && self.integer_digits.starts_with('0')
    }
}

/// Matches the entire cell against `[ws][+|-]digits[.digits][ws]`.
///
/// Returns `None` when the cell is anything else, including values that only
/// start like a number (`"12abc"`).
pub fn match_decimal(cell: &str) -> Option<DecimalParts<'_>> {
    let captures = decimal_pattern().captures(cell)?;
    let integer_digits = captures.get(2)?.as_str();
    Some(DecimalParts {
        sign: captures
            .get(1)
            .and_then(|sign| sign.as_str().chars().next()),
        integer_digits,
        fraction_digits: captures.get(3).map(|digits| digits.as_str()),
    })
}
