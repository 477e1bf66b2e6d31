//! Qualifying-cell discovery

use crate::types::{DownloadTarget, UploadedTable};
use std::collections::HashSet;

/// Trimmed value of a qualifying cell, if the cell qualifies
fn qualifying_value(row: &[String], position: usize) -> Option<&str> {
    row.get(position)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
}

/// Qualifying cells of one column, in row order (header excluded)
///
/// Returns an empty list for a column the table does not have.
pub fn column_targets(table: &UploadedTable, column: &str) -> Vec<DownloadTarget> {
    let Some(position) = table.column_position(column) else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(row_index, row)| {
            qualifying_value(row, position).map(|url| DownloadTarget {
                column: column.to_string(),
                row_index,
                url: url.to_string(),
            })
        })
        .collect()
}

/// Selected columns without repeats, first occurrence kept
pub fn distinct_columns(columns: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .filter(|column| seen.insert(column.as_str()))
        .cloned()
        .collect()
}

/// Number of qualifying cells across the selected columns
///
/// Unknown columns contribute nothing.
pub fn count_qualifying(table: &UploadedTable, columns: &[String]) -> usize {
    columns
        .iter()
        .filter_map(|column| table.column_position(column))
        .map(|position| {
            table
                .data_rows()
                .iter()
                .filter(|row| qualifying_value(row, position).is_some())
                .count()
        })
        .sum()
}
