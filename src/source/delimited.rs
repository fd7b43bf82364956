//! Delimited text input (CSV, TSV).
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::info;

use super::{Record, SourceError, Table};

/// Read a delimited file with a header row.
pub fn read_file(path: &Path, delimiter: u8) -> Result<Table, SourceError> {
    info!("Reading {}", path.display());
    let file = File::open(path).map_err(csv::Error::from)?;
    read(file, delimiter)
}

/// Read delimited text with a header row from `reader`.
///
/// Short rows are accepted; their trailing cells are absent.
pub fn read<R: Read>(reader: R, delimiter: u8) -> Result<Table, SourceError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if columns.iter().all(String::is_empty) {
        return Err(SourceError::NoHeader);
    }

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(i + 2);
        let cells: HashMap<String, String> = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.clone(), cell.to_string()))
            .collect();
        records.push(Record::new(line, cells));
    }

    Ok(Table { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Row;
    use std::io::Write;

    #[test]
    fn test_read_csv() {
        let data = "LEGACY_ID,FIRST_NAME,LAST_NAME\nID1,Foo,Bar\nID2,Baz,\n";
        let table = read(data.as_bytes(), b',').unwrap();

        assert_eq!(table.columns, vec!["LEGACY_ID", "FIRST_NAME", "LAST_NAME"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].get("FIRST_NAME"), Some("Foo"));
        assert_eq!(table.records[0].line(), 2);
        assert_eq!(table.records[1].get("LAST_NAME"), Some(""));
        assert_eq!(table.records[1].line(), 3);
    }

    #[test]
    fn test_short_rows() {
        let data = "A;B;C\n1;2\n";
        let table = read(data.as_bytes(), b';').unwrap();
        let record = &table.records[0];
        assert_eq!(record.get("B"), Some("2"));
        assert_eq!(record.get("C"), None);
    }

    #[test]
    fn test_quoted_cells() {
        let data = "ID,ADDRESS\nID1,\"49 Foo St, Bar\"\n";
        let table = read(data.as_bytes(), b',').unwrap();
        assert_eq!(table.records[0].get("ADDRESS"), Some("49 Foo St, Bar"));
    }

    #[test]
    fn test_empty_input() {
        let err = read("".as_bytes(), b',').unwrap_err();
        assert!(matches!(err, SourceError::NoHeader));
    }

    #[test]
    fn test_read_file() {
        let mut temp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp, "ID,NAME\nC1,Smith\n").unwrap();

        let table = read_file(temp.path(), b',').unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].get("NAME"), Some("Smith"));
    }
}
