//! Store seam
//!
//! Defines the EntityStore trait the build and verify paths talk to, and an
//! in-memory reference implementation:
//! - MemoryStore: in-process store for round-trip tests and examples
//!
//! A store session is supplied externally, single-writer, and used
//! synchronously for the duration of one table-processing call. Real
//! implementations wrap an ORM session; nothing in this SDK touches a
//! connection directly.

use crate::mapping::EntityMapping;
use crate::models::{Entity, Value};

pub mod memory;

pub use memory::MemoryStore;

/// Error type for store operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Saving rejected one or more entities; one message per violation
    #[error("store validation failed with {} error(s)", .0.len())]
    Validation(Vec<String>),

    /// Entity metadata could not be resolved
    #[error("entity mapping unavailable: {0}")]
    Mapping(String),

    /// A lookup query failed
    #[error("query failed: {0}")]
    Query(String),

    /// A SQL script failed to execute
    #[error("script execution failed: {0}")]
    Script(String),

    /// Saving failed for a non-validation reason
    #[error("save failed: {0}")]
    Save(String),
}

/// One conjunct of a lookup predicate: `property == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupCriterion {
    pub property: String,
    pub value: Value,
}

/// Trait for entity store sessions
///
/// Abstracts the ORM session the fixtures are written to and read back
/// from: pending-insert registration, change-tracker attachment, ad-hoc
/// script execution, saving, metadata resolution, and predicate lookups.
pub trait EntityStore<T: Entity> {
    /// Resolve the entity type's table mapping from live metadata.
    fn mapping(&self) -> Result<EntityMapping, StoreError>;

    /// Register an entity for insertion on the next save.
    fn add(&mut self, entity: T);

    /// Attach an already-persisted entity to the change tracker without
    /// scheduling an insert.
    fn attach(&mut self, entity: T);

    /// Execute a raw SQL script against the backing database.
    fn execute_script(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Persist pending changes. Validation failures report every violation
    /// message via [`StoreError::Validation`].
    fn save_changes(&mut self) -> Result<(), StoreError>;

    /// First persisted entity matching every criterion, with the named
    /// single-valued navigation properties eagerly loaded.
    fn find_first(
        &self,
        criteria: &[LookupCriterion],
        includes: &[String],
    ) -> Result<Option<T>, StoreError>;
}
