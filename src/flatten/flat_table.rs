use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::flatten::{render_csv, write_csv_records};

/// One flattened record: header -> display text, never nested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRow(pub IndexMap<String, String>);

impl FlatRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.0.get(header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

/// Ordered headers plus rectangular rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<FlatRow>,
}

impl FlatTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `count` rows, for previews that defer the rest to export.
    pub fn visible(&self, count: usize) -> &[FlatRow] {
        &self.rows[..count.min(self.rows.len())]
    }

    /// Every cell under `header`, in row order.
    pub fn column(&self, header: &str) -> Vec<&str> {
        self.rows.iter().map(|row| row.get(header).unwrap_or_default()).collect()
    }

    pub fn to_csv(&self) -> csv::Result<String> {
        render_csv(&self.headers, &self.rows)
    }

    /// Write the table as CSV to `path`, replacing any existing file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut sink = write_csv_records(BufWriter::new(file), &self.headers, &self.rows)?;
        sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FlatTable {
        let rows = (1..=3)
            .map(|i| FlatRow(IndexMap::from([("Name".to_string(), format!("Row {i}"))])))
            .collect();
        FlatTable { headers: vec!["Name".into()], rows }
    }

    #[test]
    fn test_visible_caps_rows() {
        let table = table();
        assert_eq!(table.visible(2).len(), 2);
        assert_eq!(table.visible(50).len(), 3);
    }

    #[test]
    fn test_column() {
        assert_eq!(table().column("Name"), vec!["Row 1", "Row 2", "Row 3"]);
        assert_eq!(table().column("Other"), vec!["", "", ""]);
    }

    #[test]
    fn test_write_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        table().write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Name\r\nRow 1\r\nRow 2\r\nRow 3\r\n");
        assert_eq!(table().to_csv().unwrap(), written);
    }
}
