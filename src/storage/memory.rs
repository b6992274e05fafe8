//! In-memory entity store
//!
//! Reference [`EntityStore`] used by the SDK's own tests and as a model for
//! wrapping a real ORM session. Entities live in plain vectors; executed
//! scripts are recorded rather than interpreted, and an optional validator
//! closure stands in for store-side entity validation.

use super::{EntityStore, LookupCriterion, StoreError};
use crate::mapping::EntityMapping;
use crate::models::Entity;

type Validator<T> = Box<dyn Fn(&T) -> Vec<String>>;

/// In-process store session.
pub struct MemoryStore<T> {
    mapping: EntityMapping,
    pending: Vec<T>,
    attached: Vec<T>,
    saved: Vec<T>,
    scripts: Vec<String>,
    validator: Option<Validator<T>>,
}

impl<T: Entity> MemoryStore<T> {
    /// Store whose metadata resolution returns the given mapping.
    pub fn new(mapping: EntityMapping) -> Self {
        Self {
            mapping,
            pending: Vec::new(),
            attached: Vec::new(),
            saved: Vec::new(),
            scripts: Vec::new(),
            validator: None,
        }
    }

    /// Install a per-entity validator; each returned message is one
    /// validation violation reported on save.
    pub fn with_validator(mut self, validator: impl Fn(&T) -> Vec<String> + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Entities persisted by past saves.
    pub fn saved(&self) -> &[T] {
        &self.saved
    }

    /// Entities added but not yet saved.
    pub fn pending(&self) -> &[T] {
        &self.pending
    }

    /// Entities attached but not yet saved.
    pub fn attached(&self) -> &[T] {
        &self.attached
    }

    /// Scripts passed to [`EntityStore::execute_script`], oldest first.
    pub fn executed_scripts(&self) -> &[String] {
        &self.scripts
    }
}

impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    fn mapping(&self) -> Result<EntityMapping, StoreError> {
        Ok(self.mapping.clone())
    }

    fn add(&mut self, entity: T) {
        self.pending.push(entity);
    }

    fn attach(&mut self, entity: T) {
        self.attached.push(entity);
    }

    fn execute_script(&mut self, sql: &str) -> Result<(), StoreError> {
        self.scripts.push(sql.to_string());
        Ok(())
    }

    fn save_changes(&mut self) -> Result<(), StoreError> {
        if let Some(validator) = &self.validator {
            let messages: Vec<String> =
                self.pending.iter().flat_map(|entity| validator(entity)).collect();

            if !messages.is_empty() {
                return Err(StoreError::Validation(messages));
            }
        }

        self.saved.append(&mut self.pending);
        self.saved.append(&mut self.attached);

        Ok(())
    }

    fn find_first(
        &self,
        criteria: &[LookupCriterion],
        _includes: &[String],
    ) -> Result<Option<T>, StoreError> {
        // Includes are eager-load hints for real sessions; in-memory
        // entities already hold their object graphs.
        Ok(self
            .saved
            .iter()
            .find(|entity| {
                criteria.iter().all(|criterion| {
                    entity.get(&criterion.property).as_ref() == Some(&criterion.value)
                })
            })
            .cloned())
    }
}
