//! Entity graph verification ("Then")
//!
//! [`FixtureVerifier`] mirrors the builder's tree walk on the read side:
//! per top-level row it rebuilds the lookup key, queries the persisted
//! store, asserts every checked scalar column, and then replays collection
//! routes as assertions instead of builds. Nothing is persisted; every
//! mismatch aborts the verification with a descriptive error.

use crate::hierarchy::{
    HierarchyShape, KeyTuple, RouteError, TreeError, TreeParser, find_match,
    hierarchy_column_names, root_ancestor,
};
use crate::models::{Entity, ModelError, Table, Value, hydrate};
use crate::storage::{EntityStore, LookupCriterion, StoreError};
use crate::validation::{ConfigError, validate_routes};
use std::collections::BTreeMap;
use tracing::debug;

/// Error during entity graph verification
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Lookup properties identify which persisted entity corresponds to a
    /// table row; verification cannot run without at least one
    #[error("no lookup properties provided for the verification step")]
    NoLookupProperties,

    /// The table's hierarchy columns do not parse into a valid tree
    #[error("hierarchy parsing failed: {0}")]
    Tree(#[from] TreeError),

    /// A deep row could not be routed to a collection
    #[error("collection routing failed: {0}")]
    Route(#[from] RouteError),

    /// A cell could not be hydrated into the comparison entity
    #[error("entity hydration failed: {0}")]
    Model(#[from] ModelError),

    /// The configured routes are invalid
    #[error("route configuration invalid: {0}")]
    Config(#[from] ConfigError),

    /// A table column matches no collection route, hierarchy key, or
    /// entity property
    #[error("column {column} does not match any entity property")]
    UnsupportedColumn { column: String },

    /// A configured lookup property is not an entity property
    #[error("invalid lookup property {property}")]
    UnknownLookupProperty { property: String },

    /// No persisted entity matched a row's lookup predicate
    #[error("entity not found at row {row}")]
    EntityNotFound { row: usize },

    /// A checked scalar property differs between the table and the store
    #[error("invalid property value at row {row}: {property} expected {expected}, found {actual}")]
    PropertyMismatch {
        row: usize,
        property: String,
        expected: Value,
        actual: Value,
    },

    /// A collection assertion callback reported a mismatch
    #[error("collection check failed at row {row}, column {column}: {message}")]
    CollectionCell {
        row: usize,
        column: String,
        message: String,
    },

    /// A store operation failed
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

type CheckCallback<T> = Box<dyn Fn(&T, &str, &str, Option<&KeyTuple>) -> Result<(), String>>;

struct CheckRoute<T> {
    prefix: String,
    shape: Option<HierarchyShape>,
    check: CheckCallback<T>,
}

impl<T> CheckRoute<T> {
    fn check_row(
        &self,
        entity: &T,
        table: &Table,
        row: usize,
        key: Option<&KeyTuple>,
    ) -> Result<(), VerifyError> {
        let cells = table
            .row(row)
            .ok_or(ModelError::RowOutOfRange { row })?;

        for (index, header) in table.header().iter().enumerate() {
            if !header.starts_with(&self.prefix) {
                continue;
            }

            (self.check)(entity, header, &cells[index], key).map_err(|message| {
                VerifyError::CollectionCell {
                    row,
                    column: header.clone(),
                    message,
                }
            })?;
        }

        Ok(())
    }
}

struct LookupProperty {
    property: String,
    default: Option<Value>,
}

/// Looks up persisted entities from fixture tables and asserts their
/// scalar properties and owned collections match the table contents.
///
/// # Example
///
/// ```rust,ignore
/// FixtureVerifier::new(&store)
///     .lookup_property("Number")
///     .collection_include("Tag.", |invoice: &Invoice, header, cell| {
///         invoice.tags.iter().any(|tag| tag.matches(header, cell))
///             .then_some(())
///             .ok_or_else(|| format!("tag {header} missing"))
///     })
///     .execute(&table)?;
/// ```
pub struct FixtureVerifier<'a, T, S> {
    store: &'a S,
    lookups: Vec<LookupProperty>,
    includes: Vec<String>,
    routes: Vec<CheckRoute<T>>,
}

impl<'a, T, S> FixtureVerifier<'a, T, S>
where
    T: Entity + 'static,
    S: EntityStore<T>,
{
    /// Verifier reading through the given store session.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            lookups: Vec::new(),
            includes: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Identify persisted entities by equality on this property.
    pub fn lookup_property(mut self, property: impl Into<String>) -> Self {
        self.lookups.push(LookupProperty {
            property: property.into(),
            default: None,
        });
        self
    }

    /// Identify by this property, substituting `default` when the table
    /// left the property at its canonical default.
    pub fn lookup_property_or(mut self, property: impl Into<String>, default: Value) -> Self {
        self.lookups.push(LookupProperty {
            property: property.into(),
            default: Some(default),
        });
        self
    }

    /// Eager-load hint for a single-valued navigation property on the
    /// store query.
    pub fn include(mut self, property: impl Into<String>) -> Self {
        self.includes.push(property.into());
        self
    }

    /// First-level collection assertions: per level-0 row, `check` runs for
    /// every header starting with `column_prefix`, returning a message on
    /// mismatch.
    pub fn collection_include(
        mut self,
        column_prefix: impl Into<String>,
        check: impl Fn(&T, &str, &str) -> Result<(), String> + 'static,
    ) -> Self {
        self.routes.push(CheckRoute {
            prefix: column_prefix.into(),
            shape: None,
            check: Box::new(move |entity, header, cell, _| check(entity, header, cell)),
        });
        self
    }

    /// Nested collection assertions addressed by a hierarchy shape; `check`
    /// receives the row's typed key tuple to find the right logical group.
    pub fn nested_collection_include(
        mut self,
        column_prefix: impl Into<String>,
        shape: HierarchyShape,
        check: impl Fn(&T, &str, &str, &KeyTuple) -> Result<(), String> + 'static,
    ) -> Self {
        self.routes.push(CheckRoute {
            prefix: column_prefix.into(),
            shape: Some(shape),
            check: Box::new(move |entity, header, cell, key| match key {
                Some(key) => check(entity, header, cell, key),
                None => Ok(()),
            }),
        });
        self
    }

    /// Verify one table against the persisted store.
    ///
    /// Returns the found top-level entities in row order.
    pub fn execute(&self, table: &Table) -> Result<Vec<T>, VerifyError> {
        if self.lookups.is_empty() {
            return Err(VerifyError::NoLookupProperties);
        }

        let route_config: Vec<(&str, Option<&HierarchyShape>)> = self
            .routes
            .iter()
            .map(|route| (route.prefix.as_str(), route.shape.as_ref()))
            .collect();
        validate_routes(&route_config)?;

        let shapes: Vec<Option<&HierarchyShape>> =
            route_config.iter().map(|(_, shape)| *shape).collect();
        let columns = hierarchy_column_names(&shapes);
        let rows = TreeParser::new(table, columns.clone()).parse()?;
        let checked = self.properties_to_check(table, &columns)?;

        debug!(
            "verifying {} row(s) against the store, checking {} scalar column(s)",
            rows.len(),
            checked.len()
        );

        let mut by_row: BTreeMap<usize, T> = BTreeMap::new();

        for (row, info) in rows.iter().enumerate() {
            if info.level != 0 {
                continue;
            }

            let mut transient: T = hydrate(table, row)?;
            self.apply_lookup_defaults(&mut transient)?;

            let criteria = self.lookup_criteria(&transient)?;
            let found = self
                .store
                .find_first(&criteria, &self.includes)?
                .ok_or(VerifyError::EntityNotFound { row })?;

            for property in &checked {
                let expected = transient.get(property).unwrap_or(Value::Null);
                let actual = found.get(property).unwrap_or(Value::Null);

                if expected != actual {
                    return Err(VerifyError::PropertyMismatch {
                        row,
                        property: property.clone(),
                        expected,
                        actual,
                    });
                }
            }

            for route in &self.routes {
                if route.shape.is_none() {
                    route.check_row(&found, table, row, None)?;
                }
            }

            by_row.insert(row, found);
        }

        let max_level = rows.iter().map(|info| info.level).max().unwrap_or(0);

        for level in 1..=max_level {
            for (row, info) in rows.iter().enumerate() {
                if info.level != level {
                    continue;
                }

                let root = root_ancestor(&rows, row);
                let (route_index, key) = find_match(&shapes, &info.key)?;

                if matches!(
                    self.routes[route_index].shape,
                    Some(HierarchyShape::Composite(_))
                ) {
                    key.ensure_complete()?;
                }

                let entity = by_row
                    .get(&root)
                    .ok_or(TreeError::ParentNotFound { row, level })?;

                self.routes[route_index].check_row(entity, table, row, Some(&key))?;
            }
        }

        Ok(by_row.into_values().collect())
    }

    /// Headers not consumed by a route prefix or hierarchy column must name
    /// an entity property; those are the scalar columns checked per row.
    fn properties_to_check(
        &self,
        table: &Table,
        hierarchy_columns: &[String],
    ) -> Result<Vec<String>, VerifyError> {
        let mut checked = Vec::new();

        for header in table.header() {
            if self
                .routes
                .iter()
                .any(|route| header.starts_with(&route.prefix))
            {
                continue;
            }

            if hierarchy_columns.contains(header) {
                continue;
            }

            if T::property_kind(header).is_none() {
                return Err(VerifyError::UnsupportedColumn {
                    column: header.clone(),
                });
            }

            checked.push(header.clone());
        }

        Ok(checked)
    }

    /// Non-overwrite application of lookup defaults: a default lands only
    /// when the hydrated property still holds its canonical default.
    fn apply_lookup_defaults(&self, transient: &mut T) -> Result<(), VerifyError> {
        for lookup in &self.lookups {
            let Some(default) = &lookup.default else {
                continue;
            };

            let current =
                transient
                    .get(&lookup.property)
                    .ok_or_else(|| VerifyError::UnknownLookupProperty {
                        property: lookup.property.clone(),
                    })?;

            if current.is_canonical_default() {
                transient.set(&lookup.property, default.clone())?;
            }
        }

        Ok(())
    }

    fn lookup_criteria(&self, transient: &T) -> Result<Vec<LookupCriterion>, VerifyError> {
        self.lookups
            .iter()
            .map(|lookup| {
                let value =
                    transient
                        .get(&lookup.property)
                        .ok_or_else(|| VerifyError::UnknownLookupProperty {
                            property: lookup.property.clone(),
                        })?;

                Ok(LookupCriterion {
                    property: lookup.property.clone(),
                    value,
                })
            })
            .collect()
    }
}
