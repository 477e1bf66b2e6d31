//! Spreadsheet ingestion
//!
//! Turns uploaded CSV or XLS/XLSX bytes into a column-addressable row set.
//! Parsing is pure; storing the result is the caller's job.

use crate::error::IngestError;
use crate::types::UploadedTable;
use calamine::Reader;
use std::io::Cursor;

/// Header fragment pair that gets merged back into one column
///
/// Upstream exports contain a header with an unescaped comma
/// ("... professional, but ideally ..."), which CSV parsing splits in two.
const SPLIT_HEADER_TAIL: &str = "professional";
const SPLIT_HEADER_HEAD: &str = "but ideally";

/// Supported upload formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestFormat {
    /// Comma-separated text (`.csv`)
    Csv,
    /// Spreadsheet workbook (`.xls`, `.xlsx`)
    Spreadsheet,
}

impl IngestFormat {
    /// Pick the format from a filename's extension (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedFormat`] for any other extension.
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".csv" => Ok(IngestFormat::Csv),
            ".xls" | ".xlsx" => Ok(IngestFormat::Spreadsheet),
            _ => Err(IngestError::UnsupportedFormat { extension }),
        }
    }
}

/// Columns and raw records parsed from an upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSheet {
    /// Logical column names (trimmed, fragments merged)
    pub columns: Vec<String>,
    /// Every raw record, header first
    pub rows: Vec<Vec<String>>,
}

impl ParsedSheet {
    /// Attach the registry key
    pub fn into_table(self, filename: impl Into<String>) -> UploadedTable {
        UploadedTable {
            filename: filename.into(),
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Parse uploaded bytes in the given format
///
/// # Errors
///
/// - [`IngestError::DecodeFailure`] if the bytes are not valid UTF-8 CSV or a
///   readable workbook
/// - [`IngestError::EmptyFile`] if no records were found
pub fn ingest(bytes: &[u8], format: IngestFormat) -> Result<ParsedSheet, IngestError> {
    let rows = match format {
        IngestFormat::Csv => read_csv(bytes)?,
        IngestFormat::Spreadsheet => read_workbook(bytes)?,
    };

    let header = rows.first().ok_or(IngestError::EmptyFile)?;
    let trimmed: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    let columns = merge_split_headers(trimmed);

    tracing::debug!(
        columns = columns.len(),
        rows = rows.len(),
        ?format,
        "Parsed upload"
    );

    Ok(ParsedSheet { columns, rows })
}

/// Parse an upload, choosing the format from its filename
///
/// # Errors
///
/// Same as [`ingest`], plus [`IngestError::UnsupportedFormat`].
pub fn ingest_file(filename: &str, bytes: &[u8]) -> Result<ParsedSheet, IngestError> {
    ingest(bytes, IngestFormat::from_filename(filename)?)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| IngestError::DecodeFailure(format!("file is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| IngestError::DecodeFailure(format!("malformed CSV: {e}")))
        })
        .collect()
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::DecodeFailure(format!("unreadable workbook: {e}")))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => {
            range.map_err(|e| IngestError::DecodeFailure(format!("unreadable sheet: {e}")))?
        }
        None => return Err(IngestError::EmptyFile),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Merge header fragments split by an unescaped comma
///
/// Only the header carries the stray comma, so data rows stay aligned with
/// the merged column list.
fn merge_split_headers(header: Vec<String>) -> Vec<String> {
    let mut columns = Vec::with_capacity(header.len());
    let mut fragments = header.into_iter().peekable();

    while let Some(current) = fragments.next() {
        let merges = current.ends_with(SPLIT_HEADER_TAIL)
            && fragments
                .peek()
                .is_some_and(|next| next.starts_with(SPLIT_HEADER_HEAD));

        match fragments.next_if(|_| merges) {
            Some(next) => columns.push(format!("{current}, {next}")),
            None => columns.push(current),
        }
    }

    columns
}
