//! Tree reconstruction over fill-down row keys

use super::TreeError;
use super::row_key::{RowKey, extract_row_keys, fill_down};
use crate::models::Table;
use serde::Serialize;

/// Parsed position of one table row within the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowInfo {
    /// Nesting depth; 0 is top level
    pub level: usize,
    /// Index of the nearest preceding row exactly one level up
    pub parent: Option<usize>,
    /// The row's fill-down-expanded key
    pub key: RowKey,
}

/// Reconstructs the parent/child forest encoded by a table's hierarchy
/// columns.
///
/// A row's level is the number of key values it carries after fill-down:
/// top-level rows leave every key cell empty, a depth-1 row carries one,
/// and so on. Each deep row nests below the closest preceding row with one
/// key value fewer. Several top-level rows can coexist; each opens an
/// independent root.
///
/// # Example
///
/// ```rust
/// use table_fixtures_sdk::hierarchy::TreeParser;
/// use table_fixtures_sdk::models::Table;
///
/// let table = Table::parse(
///     "| Number | Line | Line.Product |
///      | A      |      |              |
///      |        | 1    | anvil        |
///      |        | 2    | rocket       |",
/// )
/// .unwrap();
///
/// let rows = TreeParser::new(&table, vec!["Line".into()]).parse().unwrap();
/// assert_eq!(rows[0].level, 0);
/// assert_eq!(rows[1].parent, Some(0));
/// assert_eq!(rows[2].parent, Some(0));
/// ```
pub struct TreeParser<'a> {
    table: &'a Table,
    columns: Vec<String>,
}

impl<'a> TreeParser<'a> {
    /// Parser over `table` using the ordered hierarchy column names.
    pub fn new(table: &'a Table, columns: Vec<String>) -> Self {
        Self { table, columns }
    }

    /// Derive `{level, parent, key}` for every row.
    ///
    /// With no hierarchy columns every row is top level. Otherwise each
    /// row's level is its present-key count after fill-down, and each deep
    /// row's parent is the nearest preceding row at exactly one level up.
    pub fn parse(&self) -> Result<Vec<RowInfo>, TreeError> {
        let mut keys = extract_row_keys(self.table, &self.columns)?;

        fill_down(&mut keys, &self.columns)?;

        let mut rows: Vec<RowInfo> = Vec::with_capacity(keys.len());

        for (index, key) in keys.into_iter().enumerate() {
            let level = key.present_count();

            let parent = if level == 0 {
                None
            } else {
                let found = rows
                    .iter()
                    .rposition(|candidate| candidate.level == level - 1);
                match found {
                    Some(parent) => Some(parent),
                    None => return Err(TreeError::ParentNotFound { row: index, level }),
                }
            };

            rows.push(RowInfo { level, parent, key });
        }

        Ok(rows)
    }
}

/// Index of the top-level row a row descends from (itself, for level-0
/// rows).
///
/// Deep rows attach their data through the root entity; the typed key
/// tuple, not the physical ancestor instance, disambiguates which logical
/// parent group the row belongs to.
pub fn root_ancestor(rows: &[RowInfo], row: usize) -> usize {
    let mut current = row;

    while let Some(parent) = rows[current].parent {
        current = parent;
    }

    current
}
