//! Entity/table mapping
//!
//! The mapping side of the store seam: how an entity type maps onto its
//! backing table (name, primary keys, identity flag, property-to-column
//! pairs), plus literal INSERT generation for identity-preserving bulk
//! loads.

pub mod sql;

use serde::{Deserialize, Serialize};

pub use sql::{SqlError, bulk_insert_script, insert_statement, sql_literal};

/// How one entity type maps onto its backing table.
///
/// Computed on demand by the store from live ORM metadata; not cached and
/// never mutated by this SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Backing table name
    pub table_name: String,
    /// Ordered primary-key column names
    pub keys: Vec<String>,
    /// Whether the table has a store-generated identity column
    pub has_identity: bool,
    /// Ordered (property name, column name) pairs for every mapped,
    /// non-computed property
    pub properties: Vec<(String, String)>,
}

impl EntityMapping {
    /// Column backing a property, if the property is mapped.
    pub fn column_for(&self, property: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, column)| column.as_str())
    }
}
