//! Spreadsheet input (xlsx, xlsm, xlsb, xls, ods).
//!
//! The first row of the sheet is the header. Empty cells are left out of
//! the record, so they read as absent.
use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::info;

use super::{Record, SourceError, Table};

/// Read `sheet` (or the first sheet) of the workbook at `path`.
pub fn read_file(path: &Path, sheet: Option<&str>) -> Result<Table, SourceError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();

    let name = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => return Err(SourceError::SheetNotFound(name.to_string())),
        None => names.first().cloned().ok_or(SourceError::NoSheets)?,
    };
    info!("Reading {} [{}]", path.display(), name);

    let range = workbook.worksheet_range(&name)?;
    let mut rows = range.rows();
    let header = rows.next().ok_or(SourceError::NoHeader)?;
    let columns: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    let first_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let records = rows
        .enumerate()
        .map(|(i, row)| {
            let cells: HashMap<String, String> = columns
                .iter()
                .zip(row.iter())
                .filter(|(column, _)| !column.is_empty())
                .filter_map(|(column, cell)| cell_text(cell).map(|text| (column.clone(), text)))
                .collect();
            Record::new(first_line + i + 1, cells)
        })
        .collect();

    Ok(Table { columns, records })
}

/// Text of a cell, `None` when empty.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
