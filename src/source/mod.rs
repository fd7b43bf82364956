//! Tabular row sources.
//!
//! Inputs are read whole into a [`Table`]: the header columns plus one
//! [`Record`] per data row. Delimited text goes through the `csv` crate,
//! spreadsheets through `calamine`.
use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::mapping::Row;

pub mod delimited;
pub mod spreadsheet;

/// Errors that can occur while reading an input table.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("input has no header row")]
    NoHeader,

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
}

/// Options controlling how input files are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Field delimiter for delimited text. `.tsv` files always use tabs.
    pub delimiter: u8,
    /// Sheet to read from a workbook; the first sheet when `None`.
    pub sheet: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sheet: None,
        }
    }
}

/// One data row, keyed by header column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    line: usize,
    cells: HashMap<String, String>,
}

impl Record {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// 1-based line (or spreadsheet row) the record was read from.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

impl Row for Record {
    fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// A fully read input.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether `path` has an extension [`read_table`] understands.
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    matches!(
        extension(path).as_str(),
        "csv" | "tsv" | "txt" | "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"
    )
}

/// Read an input file, choosing the reader from its extension.
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table, SourceError> {
    match extension(path).as_str() {
        "csv" | "txt" => delimited::read_file(path, options.delimiter),
        "tsv" => delimited::read_file(path, b'\t'),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            spreadsheet::read_file(path, options.sheet.as_deref())
        }
        _ => Err(SourceError::UnsupportedFormat(path.display().to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}
