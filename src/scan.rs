//! Single forward pass over a table: the header defines the columns, then
//! each data row (up to the row limit) is folded into per-column statistics.

use anyhow::Result;

use crate::{
    classify::{ColumnClass, classify_column},
    stats::ColumnStats,
};

#[derive(Debug, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub stats: ColumnStats,
}

#[derive(Debug, Clone)]
pub struct TableProfile {
    pub columns: Vec<ColumnProfile>,
    pub rows_scanned: usize,
    /// First data row, verbatim. May be shorter or longer than the header.
    pub example_row: Option<Vec<String>>,
}

impl TableProfile {
    pub fn example_value(&self, index: usize) -> Option<&str> {
        self.example_row
            .as_ref()
            .and_then(|row| row.get(index))
            .map(String::as_str)
    }

    pub fn classify(&self) -> Vec<ColumnClass> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                classify_column(
                    &column.name,
                    &column.stats,
                    self.rows_scanned,
                    self.example_value(idx),
                )
            })
            .collect()
    }
}

/// Scans `rows`, whose first item is the header row.
///
/// Returns `Ok(None)` when there is no header at all. At most `row_limit`
/// data rows are pulled from the iterator; `None` scans to the end. Cells
/// beyond the header width are ignored and short rows only update the
/// columns they have.
pub fn scan_rows<I>(rows: I, row_limit: Option<usize>) -> Result<Option<TableProfile>>
where
    I: IntoIterator<Item = Result<Vec<String>>>,
{
    let mut rows = rows.into_iter();
    let Some(header) = rows.next().transpose()? else {
        return Ok(None);
    };
    let mut columns = header
        .into_iter()
        .map(|name| ColumnProfile {
            name,
            stats: ColumnStats::new(),
        })
        .collect::<Vec<_>>();

    let mut example_row = None;
    let mut rows_scanned = 0usize;
    while row_limit.is_none_or(|limit| rows_scanned < limit) {
        let Some(row) = rows.next().transpose()? else {
            break;
        };
        for (column, cell) in columns.iter_mut().zip(row.iter()) {
            column.stats.observe(cell);
        }
        if example_row.is_none() {
            example_row = Some(row);
        }
        rows_scanned += 1;
    }

    Ok(Some(TableProfile {
        columns,
        rows_scanned,
        example_row,
    }))
}
