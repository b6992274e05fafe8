//! Models module for the SDK
//!
//! Defines the core data structures shared by the build and verify paths:
//! fixture tables, scalar cell values, and the entity seam that stands in
//! for ORM reflection.

pub mod entity;
pub mod table;
pub mod value;

pub use entity::{Entity, hydrate, replace_minimum_dates};
pub use table::{Table, TableError};
pub use value::{CanonicalDefault, UNKNOWN_DATE, Value, ValueKind};

/// Error raised while converting between table cells and entity properties.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// A property name was addressed that the entity does not expose
    #[error("entity {entity} has no property named {property}")]
    UnknownProperty { entity: String, property: String },

    /// A value of the wrong kind was assigned to a property
    #[error("property {property} expects {expected} but was given {actual}")]
    KindMismatch {
        property: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A cell could not be parsed into the property's kind
    #[error("cannot parse {raw:?} as {kind}")]
    Parse { kind: ValueKind, raw: String },

    /// A row index past the end of the table was requested
    #[error("row {row} is out of range")]
    RowOutOfRange { row: usize },
}
