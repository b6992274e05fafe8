//! Fixture table model for the SDK

use serde::{Deserialize, Serialize};

/// Error during table construction or parsing
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum TableError {
    /// Header has no columns
    #[error("table header cannot be empty")]
    EmptyHeader,

    /// A header cell is blank
    #[error("column {position} has an empty name")]
    EmptyColumnName { position: usize },

    /// Two header cells carry the same name
    #[error("duplicate column name {name}")]
    DuplicateColumn { name: String },

    /// A row does not have one cell per header column
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A pipe-table line is not delimited by `|`
    #[error("line {line} is not a pipe-delimited table row")]
    MalformedLine { line: usize },
}

/// Fixture table: an ordered header plus rows of string cells.
///
/// The header defines column order and names; duplicate names are rejected.
/// An empty string cell means "absent" and is a fill-down candidate when the
/// column is used as a hierarchy key.
///
/// # Example
///
/// ```rust
/// use table_fixtures_sdk::models::Table;
///
/// let table = Table::parse(
///     "| Number | Customer |
///      | 1001   | ACME     |",
/// )
/// .unwrap();
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.cell(0, "Customer"), Some("ACME"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from a header and rows, validating the shape.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableError> {
        if header.is_empty() {
            return Err(TableError::EmptyHeader);
        }

        for (position, name) in header.iter().enumerate() {
            if name.is_empty() {
                return Err(TableError::EmptyColumnName { position });
            }

            if header[..position].contains(name) {
                return Err(TableError::DuplicateColumn { name: name.clone() });
            }
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != header.len() {
                return Err(TableError::RowLength {
                    row,
                    expected: header.len(),
                    actual: cells.len(),
                });
            }
        }

        Ok(Self { header, rows })
    }

    /// Parse a Gherkin-style pipe table.
    ///
    /// The first non-blank line is the header; every line must start and end
    /// with `|`. Cells are trimmed, so fixtures can be aligned for
    /// readability. An empty cell stays empty (absent).
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (line_number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if !trimmed.starts_with('|') || !trimmed.ends_with('|') || trimmed.len() < 2 {
                return Err(TableError::MalformedLine { line: line_number });
            }

            let cells: Vec<String> = trimmed[1..trimmed.len() - 1]
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect();

            match header {
                None => header = Some(cells),
                Some(_) => rows.push(cells),
            }
        }

        Self::new(header.ok_or(TableError::EmptyHeader)?, rows)
    }

    /// Ordered column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// All rows, in table order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// One row's cells, if the index is in range.
    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    /// Cell value addressed by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[index].as_str())
    }
}
