//! Row key extraction and fill-down
//!
//! A row key is the tuple of hierarchy-column cells for one row, one slot
//! per configured column, `None` where the cell is empty. Fill-down lets a
//! row omit the key values it shares with the previous row: any gap to the
//! left of this row's own (deeper) key values inherits the previous row's
//! value at that position. After fill-down every key's present positions
//! form a contiguous prefix; anything else is a structural error.

use super::TreeError;
use crate::models::Table;
use serde::{Deserialize, Serialize};

/// One row's hierarchy key after extraction (and, later, fill-down).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowKey {
    components: Vec<Option<String>>,
}

impl RowKey {
    /// Key with one slot per hierarchy column; empty cells become `None`.
    pub fn new(components: Vec<Option<String>>) -> Self {
        Self { components }
    }

    /// Key slots in hierarchy-column order.
    pub fn components(&self) -> &[Option<String>] {
        &self.components
    }

    /// Number of key slots.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the key has no slots (zero hierarchy columns configured).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Count of present (non-empty) slots. After fill-down this is the
    /// row's hierarchy depth: 0 for top-level rows.
    pub fn present_count(&self) -> usize {
        self.components
            .iter()
            .filter(|component| component.is_some())
            .count()
    }

    /// Whether present slots form a contiguous prefix.
    pub fn is_contiguous_prefix(&self) -> bool {
        let mut gap_seen = false;

        for component in &self.components {
            match component {
                None => gap_seen = true,
                Some(_) if gap_seen => return false,
                Some(_) => {}
            }
        }

        true
    }
}

/// Extract one [`RowKey`] per table row from the named hierarchy columns.
///
/// A configured column missing from the header is fatal.
pub fn extract_row_keys(table: &Table, columns: &[String]) -> Result<Vec<RowKey>, TreeError> {
    let mut indices = Vec::with_capacity(columns.len());

    for column in columns {
        let index = table
            .column_index(column)
            .ok_or_else(|| TreeError::MissingHierarchyColumn {
                column: column.clone(),
            })?;
        indices.push(index);
    }

    Ok(table
        .rows()
        .iter()
        .map(|cells| {
            RowKey::new(
                indices
                    .iter()
                    .map(|&index| {
                        let cell = cells[index].as_str();
                        (!cell.is_empty()).then(|| cell.to_string())
                    })
                    .collect(),
            )
        })
        .collect())
}

/// Fill-down expand extracted row keys in place.
///
/// Rows are processed top to bottom. Within a row, slots are scanned from
/// the most specific (rightmost) to the least specific (leftmost): once a
/// present value has been seen, every absent slot encountered further left
/// inherits the previous row's value at that position. Inheriting from an
/// absent slot is fatal, as is a present value to the left of an inherited
/// gap. The first row inherits nothing and must open a top-level root: all
/// of its key slots empty.
///
/// Idempotent: filled keys pass through unchanged.
pub fn fill_down(keys: &mut [RowKey], columns: &[String]) -> Result<(), TreeError> {
    if columns.is_empty() {
        return Ok(());
    }

    for row in 0..keys.len() {
        if row == 0 {
            if keys[0].present_count() != 0 {
                return Err(TreeError::FirstRowShape {
                    column: columns[0].clone(),
                });
            }
            continue;
        }

        let mut value_seen = false;
        let mut gap_filled = false;

        for slot in (0..columns.len()).rev() {
            if keys[row].components[slot].is_none() {
                if value_seen {
                    gap_filled = true;

                    let inherited = keys[row - 1].components[slot].clone();
                    match inherited {
                        None => {
                            return Err(TreeError::MissingFillSource {
                                row,
                                column: columns[slot].clone(),
                            });
                        }
                        Some(value) => keys[row].components[slot] = Some(value),
                    }
                }

                continue;
            }

            if gap_filled {
                return Err(TreeError::NonMonotonicKey { row });
            }

            value_seen = true;
        }
    }

    Ok(())
}
