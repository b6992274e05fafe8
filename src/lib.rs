//! Table Fixtures SDK - Shared library bridging BDD fixture tables to ORM entity graphs
//!
//! Provides unified interfaces for:
//! - Fixture table modelling (ordered headers, string cells, pipe-table parsing)
//! - Hierarchical table parsing (fill-down row keys, parent/child tree reconstruction)
//! - Collection routing (column-prefix addressing, typed hierarchy key tuples)
//! - Entity graph building ("Given": hydrate, default-fill, persist)
//! - Entity graph verification ("Then": look up, assert scalars and collections)
//! - Entity/table mapping and literal INSERT generation (identity-insert bulk loads)

pub mod builder;
pub mod hierarchy;
pub mod mapping;
pub mod models;
pub mod storage;
pub mod validation;
pub mod verifier;

// Re-export commonly used types
pub use builder::{BuildError, FixtureBuilder};
pub use hierarchy::{
    HierarchyShape, KeyComponent, KeyScalar, KeyTuple, RouteError, RowInfo, RowKey, TreeError,
    TreeParser,
};
pub use mapping::{EntityMapping, SqlError};
pub use models::{
    CanonicalDefault, Entity, ModelError, Table, TableError, UNKNOWN_DATE, Value, ValueKind,
};
pub use storage::{EntityStore, LookupCriterion, MemoryStore, StoreError};
pub use validation::{ConfigError, ConfigResult};
pub use verifier::{FixtureVerifier, VerifyError};
