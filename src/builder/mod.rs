//! Entity graph building ("Given")
//!
//! [`FixtureBuilder`] turns one fixture table into a persisted entity
//! graph: top-level rows hydrate entities, property rules fill in what the
//! table leaves out, and collection routes fan each row's prefix-matched
//! cells into owned collections. Deep rows are routed to the correct root
//! entity through the hierarchy tree, with the row's typed key tuple
//! handed to the build callback so it can place the child in the right
//! logical group.

use crate::hierarchy::{
    HierarchyShape, KeyTuple, RouteError, TreeError, TreeParser, find_match,
    hierarchy_column_names, root_ancestor,
};
use crate::mapping::{SqlError, bulk_insert_script};
use crate::models::{CanonicalDefault, Entity, ModelError, Table, hydrate, replace_minimum_dates};
use crate::storage::{EntityStore, StoreError};
use crate::validation::{ConfigError, validate_routes};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Error during entity graph building or persistence
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The table's hierarchy columns do not parse into a valid tree
    #[error("hierarchy parsing failed: {0}")]
    Tree(#[from] TreeError),

    /// A deep row could not be routed to a collection
    #[error("collection routing failed: {0}")]
    Route(#[from] RouteError),

    /// A cell could not be hydrated into an entity property
    #[error("entity hydration failed: {0}")]
    Model(#[from] ModelError),

    /// The configured routes are invalid
    #[error("route configuration invalid: {0}")]
    Config(#[from] ConfigError),

    /// Literal INSERT generation failed
    #[error("insert generation failed: {0}")]
    Sql(#[from] SqlError),

    /// The store rejected the batch; one line per validation message
    #[error("entity validation failed:\n{0}")]
    Validation(String),

    /// A store operation failed for a non-validation reason
    #[error("store operation failed: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BuildError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(messages) => Self::Validation(messages.join("\n")),
            other => Self::Store(other),
        }
    }
}

type ValueRule<T> = Box<dyn Fn(&mut T)>;
type IncludeRule<T> = Box<dyn Fn(&mut T, &Table, usize) -> Result<(), ModelError>>;
type BuildCallback<T, C> = Box<dyn Fn(&T, &str, &str, Option<&KeyTuple>) -> Option<C>>;
type CollectionLens<T, C> = Box<dyn Fn(&mut T) -> &mut Vec<C>>;

/// One owned-collection attachment point, type-erased over the child type.
trait BuildRoute<T> {
    fn column_prefix(&self) -> &str;

    fn shape(&self) -> Option<&HierarchyShape>;

    /// Build children from the row's prefix-matched cells and put them into
    /// the owning collection. `reset` clears the collection first; rows
    /// after the first for the same (root, route) pair append instead, so
    /// sibling rows accumulate.
    fn attach(
        &self,
        entity: &mut T,
        table: &Table,
        row: usize,
        key: Option<&KeyTuple>,
        reset: bool,
    ) -> Result<(), BuildError>;
}

struct TypedBuildRoute<T, C> {
    prefix: String,
    shape: Option<HierarchyShape>,
    collection: CollectionLens<T, C>,
    build: BuildCallback<T, C>,
}

impl<T: Entity, C> BuildRoute<T> for TypedBuildRoute<T, C> {
    fn column_prefix(&self) -> &str {
        &self.prefix
    }

    fn shape(&self) -> Option<&HierarchyShape> {
        self.shape.as_ref()
    }

    fn attach(
        &self,
        entity: &mut T,
        table: &Table,
        row: usize,
        key: Option<&KeyTuple>,
        reset: bool,
    ) -> Result<(), BuildError> {
        let cells = table
            .row(row)
            .ok_or(ModelError::RowOutOfRange { row })?;
        let mut built = Vec::new();

        for (index, header) in table.header().iter().enumerate() {
            if !header.starts_with(&self.prefix) {
                continue;
            }

            if let Some(child) = (self.build)(entity, header, &cells[index], key) {
                built.push(child);
            }
        }

        let collection = (self.collection)(entity);
        if reset {
            collection.clear();
        }
        collection.extend(built);

        Ok(())
    }
}

/// Builds and persists entity graphs from fixture tables.
///
/// Configuration is fluent; [`execute`](Self::execute) processes one table
/// start to finish on the calling thread.
///
/// # Example
///
/// ```rust,ignore
/// let invoices = FixtureBuilder::new(&mut store)
///     .default_value(|invoice: &mut Invoice| &mut invoice.currency, "EUR".to_string())
///     .collection_include(
///         |invoice: &mut Invoice| &mut invoice.tags,
///         "Tag.",
///         |_, header, cell| (!cell.is_empty()).then(|| Tag::new(header, cell)),
///     )
///     .execute(&table)?;
/// ```
pub struct FixtureBuilder<'a, T, S> {
    store: &'a mut S,
    fixed_rules: Vec<ValueRule<T>>,
    default_rules: Vec<ValueRule<T>>,
    calculated_rules: Vec<ValueRule<T>>,
    includes: Vec<IncludeRule<T>>,
    routes: Vec<Box<dyn BuildRoute<T>>>,
    identity_insertion: bool,
}

impl<'a, T, S> FixtureBuilder<'a, T, S>
where
    T: Entity + 'static,
    S: EntityStore<T>,
{
    /// Builder writing through the given store session.
    pub fn new(store: &'a mut S) -> Self {
        Self {
            store,
            fixed_rules: Vec::new(),
            default_rules: Vec::new(),
            calculated_rules: Vec::new(),
            includes: Vec::new(),
            routes: Vec::new(),
            identity_insertion: false,
        }
    }

    /// Always write `value` into the addressed property, regardless of
    /// what the table hydrated.
    pub fn fixed_value<V>(
        mut self,
        property: impl Fn(&mut T) -> &mut V + 'static,
        value: V,
    ) -> Self
    where
        V: Clone + 'static,
    {
        self.fixed_rules.push(Box::new(move |entity| {
            *property(entity) = value.clone();
        }));
        self
    }

    /// Write `value` only when the property still holds its canonical
    /// default/sentinel, so table-supplied values win.
    pub fn default_value<V>(
        mut self,
        property: impl Fn(&mut T) -> &mut V + 'static,
        value: V,
    ) -> Self
    where
        V: CanonicalDefault + Clone + 'static,
    {
        self.default_rules.push(Box::new(move |entity| {
            let slot = property(entity);
            if slot.is_canonical_default() {
                *slot = value.clone();
            }
        }));
        self
    }

    /// Compute a value from the already-populated entity and apply it
    /// through the same non-overwrite path as [`default_value`](Self::default_value).
    pub fn calculated_value<V>(
        mut self,
        property: impl Fn(&mut T) -> &mut V + 'static,
        compute: impl Fn(&T) -> V + 'static,
    ) -> Self
    where
        V: CanonicalDefault + 'static,
    {
        self.calculated_rules.push(Box::new(move |entity| {
            let computed = compute(entity);
            let slot = property(entity);
            if slot.is_canonical_default() {
                *slot = computed;
            }
        }));
        self
    }

    /// Hydrate a simple single-valued sub-object from the same row and
    /// attach it. Collections cannot appear here; they go through
    /// [`collection_include`](Self::collection_include).
    pub fn include<I>(mut self, assign: impl Fn(&mut T, I) + 'static) -> Self
    where
        I: Entity + 'static,
    {
        self.includes.push(Box::new(move |entity, table, row| {
            let mut included: I = hydrate(table, row)?;
            replace_minimum_dates(&mut included)?;
            assign(entity, included);
            Ok(())
        }));
        self
    }

    /// First-level owned collection: every header starting with
    /// `column_prefix` fans out one `build` call per level-0 row, and the
    /// non-`None` results become the collection's contents.
    pub fn collection_include<C>(
        mut self,
        collection: impl Fn(&mut T) -> &mut Vec<C> + 'static,
        column_prefix: impl Into<String>,
        build: impl Fn(&T, &str, &str) -> Option<C> + 'static,
    ) -> Self
    where
        C: 'static,
    {
        self.routes.push(Box::new(TypedBuildRoute {
            prefix: column_prefix.into(),
            shape: None,
            collection: Box::new(collection),
            build: Box::new(move |entity, header, cell, _| build(entity, header, cell)),
        }));
        self
    }

    /// Nested owned collection addressed by a hierarchy shape: rows at the
    /// shape's depth route here, and `build` receives the row's typed key
    /// tuple to place each child in the right logical group.
    pub fn nested_collection_include<C>(
        mut self,
        collection: impl Fn(&mut T) -> &mut Vec<C> + 'static,
        column_prefix: impl Into<String>,
        shape: HierarchyShape,
        build: impl Fn(&T, &str, &str, &KeyTuple) -> Option<C> + 'static,
    ) -> Self
    where
        C: 'static,
    {
        self.routes.push(Box::new(TypedBuildRoute {
            prefix: column_prefix.into(),
            shape: Some(shape),
            collection: Box::new(collection),
            build: Box::new(move |entity, header, cell, key| {
                key.and_then(|key| build(entity, header, cell, key))
            }),
        }));
        self
    }

    /// Preserve explicit key values through the identity-insert path
    /// instead of plain inserts.
    pub fn identity_insertion(mut self, identity_insertion: bool) -> Self {
        self.identity_insertion = identity_insertion;
        self
    }

    /// Build the entity graph one table describes, without persisting.
    ///
    /// Rows are processed in table order within a level and levels in
    /// increasing depth order, so parents are complete before any of their
    /// descendants are visited. Returns the top-level entities in row
    /// order.
    pub fn build_entities(&self, table: &Table) -> Result<Vec<T>, BuildError> {
        let route_config: Vec<(&str, Option<&HierarchyShape>)> = self
            .routes
            .iter()
            .map(|route| (route.column_prefix(), route.shape()))
            .collect();
        validate_routes(&route_config)?;

        let shapes: Vec<Option<&HierarchyShape>> =
            route_config.iter().map(|(_, shape)| *shape).collect();
        let columns = hierarchy_column_names(&shapes);
        let rows = TreeParser::new(table, columns).parse()?;

        debug!(
            "building entity graph from {} row(s), {} route(s)",
            rows.len(),
            self.routes.len()
        );

        let mut by_row: BTreeMap<usize, T> = BTreeMap::new();

        for (row, info) in rows.iter().enumerate() {
            if info.level != 0 {
                continue;
            }

            let mut entity: T = hydrate(table, row)?;

            for include in &self.includes {
                include(&mut entity, table, row)?;
            }

            replace_minimum_dates(&mut entity)?;

            for rule in &self.fixed_rules {
                rule(&mut entity);
            }
            for rule in &self.default_rules {
                rule(&mut entity);
            }
            for rule in &self.calculated_rules {
                rule(&mut entity);
            }

            for route in &self.routes {
                if route.shape().is_none() {
                    route.attach(&mut entity, table, row, None, true)?;
                }
            }

            by_row.insert(row, entity);
        }

        let max_level = rows.iter().map(|info| info.level).max().unwrap_or(0);
        let mut touched: HashSet<(usize, usize)> = HashSet::new();

        for level in 1..=max_level {
            for (row, info) in rows.iter().enumerate() {
                if info.level != level {
                    continue;
                }

                let root = root_ancestor(&rows, row);
                let (route_index, key) = find_match(&shapes, &info.key)?;

                if matches!(self.routes[route_index].shape(), Some(HierarchyShape::Composite(_)))
                {
                    key.ensure_complete()?;
                }

                let entity = by_row
                    .get_mut(&root)
                    .ok_or(TreeError::ParentNotFound { row, level })?;
                let reset = touched.insert((root, route_index));

                self.routes[route_index].attach(entity, table, row, Some(&key), reset)?;
            }
        }

        Ok(by_row.into_values().collect())
    }

    /// Build the graph and persist it.
    pub fn execute(&mut self, table: &Table) -> Result<Vec<T>, BuildError> {
        let entities = self.build_entities(table)?;
        self.persist(entities)
    }

    /// Persist pre-built entities.
    ///
    /// With identity insertion off, entities are added and saved. With it
    /// on, a literal-SQL bulk insert runs first (bracketed by identity
    /// toggles when the table has an identity column) and the in-memory
    /// entities are attached, not re-inserted, before saving. Store
    /// validation failures abort with every violation message joined into
    /// one error.
    pub fn persist(&mut self, entities: Vec<T>) -> Result<Vec<T>, BuildError> {
        info!(
            "persisting {} fixture entities (identity insertion: {})",
            entities.len(),
            self.identity_insertion
        );

        if self.identity_insertion {
            let mapping = self.store.mapping()?;
            let script = bulk_insert_script(&mapping, &entities)?;

            self.store.execute_script(&script)?;

            for entity in &entities {
                self.store.attach(entity.clone());
            }
        } else {
            for entity in &entities {
                self.store.add(entity.clone());
            }
        }

        self.store.save_changes()?;

        Ok(entities)
    }
}
