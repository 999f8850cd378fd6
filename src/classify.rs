//! Reduces finalized column statistics to a CSV-Meta type name and size.

use std::fmt;

use serde::Serialize;

use crate::stats::ColumnStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Varchar,
    Char,
    Integer,
    Float,
    Decimal,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Varchar => "varchar",
            DataType::Char => "char",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred description of one table column, ready to be written as a schema row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnClass {
    pub name: String,
    pub data_type: DataType,
    /// `"n"` for char/varchar, `"precision,scale"` for decimal.
    pub size: Option<String>,
    pub example: Option<String>,
}

/// First matching rule wins:
///
/// 1. nothing sampled, or only nulls: `varchar`
/// 2. constant width with a non-numeric cell or a leading zero: `char`
/// 3. any leading zero: `varchar`
/// 4. every cell an integer: `integer`
/// 5. every cell a float, some not integers, non-empty: `decimal`
/// 6. otherwise `varchar`
pub fn classify_type(stats: &ColumnStats, rows_sampled: usize) -> DataType {
    if rows_sampled == 0 || stats.not_null_count == 0 {
        DataType::Varchar
    } else if stats.has_fixed_width()
        && (stats.not_float_count > 0 || stats.leading_zero_count > 0)
    {
        DataType::Char
    } else if stats.leading_zero_count > 0 {
        DataType::Varchar
    } else if stats.not_int_count == 0 {
        DataType::Integer
    } else if stats.not_float_count == 0
        && stats.not_int_count > 0
        && stats.char_len_max.is_some_and(|len| len > 0)
    {
        DataType::Decimal
    } else {
        DataType::Varchar
    }
}

/// Integer and float sizes are not derived; those columns carry no size.
pub fn type_size(data_type: DataType, stats: &ColumnStats) -> Option<String> {
    match data_type {
        DataType::Char | DataType::Varchar => stats.char_len_max.map(|len| len.to_string()),
        DataType::Decimal => match (stats.decimal_precision_max, stats.decimal_scale_max) {
            (Some(precision), Some(scale)) => Some(format!("{precision},{scale}")),
            _ => None,
        },
        DataType::Integer | DataType::Float => None,
    }
}

pub fn classify_column(
    name: &str,
    stats: &ColumnStats,
    rows_sampled: usize,
    example: Option<&str>,
) -> ColumnClass {
    let data_type = classify_type(stats, rows_sampled);
    ColumnClass {
        name: name.to_string(),
        data_type,
        size: type_size(data_type, stats),
        example: example.map(str::to_string),
    }
}
