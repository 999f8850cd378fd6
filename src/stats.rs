//! Per-column running statistics gathered while scanning a table.
//!
//! Every bound is `None` until a qualifying cell has been observed, so "never
//! seen" stays distinct from zero.

use serde::Serialize;

use crate::decimal::match_decimal;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    pub null_count: usize,
    pub not_null_count: usize,
    pub empty_count: usize,
    pub blank_count: usize,
    pub char_len_max: Option<usize>,
    pub char_len_min: Option<usize>,
    pub not_int_count: usize,
    pub not_float_count: usize,
    pub int_max: Option<i128>,
    pub float_max: Option<f64>,
    pub leading_zero_count: usize,
    pub decimal_precision_max: Option<usize>,
    pub decimal_precision_min: Option<usize>,
    pub decimal_scale_max: Option<usize>,
    pub decimal_scale_min: Option<usize>,
}

impl ColumnStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one cell into the running statistics.
    ///
    /// An empty string is a null. Every other cell updates each of the
    /// independent counters below; a cell may well be "not an integer", "a
    /// valid float" and "leading zero" at the same time.
    pub fn observe(&mut self, cell: &str) {
        if cell.is_empty() {
            self.null_count += 1;
            return;
        }
        self.not_null_count += 1;

        let char_len = cell.chars().count();
        if char_len == 0 {
            self.empty_count += 1;
        } else {
            if cell.trim().is_empty() {
                self.blank_count += 1;
            }
            self.char_len_max = Some(bound(self.char_len_max, char_len, usize::max));
            self.char_len_min = Some(bound(self.char_len_min, char_len, usize::min));
        }

        match parse_integer(cell) {
            Some(value) => {
                self.int_max = Some(self.int_max.map_or(value, |max| max.max(value)));
            }
            None => self.not_int_count += 1,
        }

        match parse_float(cell) {
            Some(value) => {
                self.float_max = Some(match self.float_max {
                    Some(max) if max < value => value,
                    Some(max) => max,
                    None => value,
                });
            }
            None => self.not_float_count += 1,
        }

        if let Some(parts) = match_decimal(cell) {
            if !parts.integer_digits.is_empty() {
                let precision = parts.precision();
                let scale = parts.scale();
                self.decimal_precision_max =
                    Some(bound(self.decimal_precision_max, precision, usize::max));
                self.decimal_precision_min =
                    Some(bound(self.decimal_precision_min, precision, usize::min));
                self.decimal_scale_max = Some(bound(self.decimal_scale_max, scale, usize::max));
                self.decimal_scale_min = Some(bound(self.decimal_scale_min, scale, usize::min));
            }
            if parts.has_leading_zero() {
                self.leading_zero_count += 1;
            }
        }
    }

    /// True when every non-null cell had the same character length.
    pub fn has_fixed_width(&self) -> bool {
        matches!(
            (self.char_len_max, self.char_len_min),
            (Some(max), Some(min)) if max == min
        )
    }
}

fn bound(current: Option<usize>, value: usize, pick: fn(usize, usize) -> usize) -> usize {
    current.map_or(value, |existing| pick(existing, value))
}

/// Base-10 integer with an optional sign; surrounding whitespace is ignored.
///
/// Literals too long for `i128` still count as integers and saturate at the
/// bound matching their sign.
pub fn parse_integer(cell: &str) -> Option<i128> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<i128>() {
        return Some(value);
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if trimmed.starts_with('-') {
        i128::MIN
    } else {
        i128::MAX
    })
}

/// Any floating-point literal `f64` accepts, including `inf` and `nan`;
/// surrounding whitespace is ignored.
pub fn parse_float(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}
