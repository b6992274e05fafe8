//! Hierarchical table parsing
//!
//! Turns a flat fixture table whose key columns encode nesting via
//! "fill-down" into a forest of rows, and routes each deep row to the
//! owned-collection slot whose hierarchy shape matches the row's key.

pub mod route;
pub mod row_key;
pub mod tree;

pub use route::{
    HierarchyShape, KeyComponent, KeyScalar, KeyTuple, RouteError, find_match,
    hierarchy_column_names,
};
pub use row_key::{RowKey, extract_row_keys, fill_down};
pub use tree::{RowInfo, TreeParser, root_ancestor};

/// Error raised while decoding row keys or reconstructing the row tree.
///
/// All of these are structural: the table's key columns do not form a valid
/// monotonic-prefix hierarchy, and the whole table-processing call aborts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TreeError {
    /// A configured hierarchy column does not exist in the table header
    #[error("missing hierarchy column {column} in the table")]
    MissingHierarchyColumn { column: String },

    /// The first row opens the first root, so all of its hierarchy key
    /// cells must be empty
    #[error("row 0 must be a top-level row: hierarchy key cells such as {column} must be empty")]
    FirstRowShape { column: String },

    /// Fill-down needed a value from the previous row, but the previous
    /// row's key position was itself absent
    #[error("row {row} cannot inherit a value for hierarchy column {column}: the previous row has none")]
    MissingFillSource { row: usize, column: String },

    /// A present key value sits to the left of an inherited gap
    #[error("row {row} has a non-contiguous hierarchy key pattern")]
    NonMonotonicKey { row: usize },

    /// No preceding row sits exactly one level above this row
    #[error("parent not found for row {row} at level {level}")]
    ParentNotFound { row: usize, level: usize },
}
