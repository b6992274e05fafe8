//! Collection route shapes and hierarchy key matching
//!
//! A collection route owns one collection slot on an entity: a column
//! prefix selecting its cell data, and (for nested collections) a hierarchy
//! shape describing which child property or property tuple forms the
//! routing key. The shape's arity doubles as the tree depth of the rows it
//! owns; matching a deep row means finding the route whose arity equals the
//! row's present-key count and parsing the key into a typed tuple.

use super::row_key::RowKey;
use crate::models::ValueKind;
use serde::{Deserialize, Serialize};

/// Error raised while matching a row key against configured routes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouteError {
    /// A deep row was matched with zero hierarchy columns configured
    #[error("cannot match a row without hierarchy key columns")]
    EmptyKey,

    /// No route's hierarchy shape has the row's arity
    #[error("no collection route matches a hierarchy key of {arity} value(s)")]
    NoMatch { arity: usize },

    /// A hierarchy key component was configured with a kind the identifier
    /// parser does not support
    #[error("hierarchy key column {column} has unsupported kind {kind}: only int, short and text keys are supported")]
    UnsupportedKeyKind { column: String, kind: ValueKind },

    /// A composite key component came out null, so the route callback
    /// cannot be given a complete tuple
    #[error("composite hierarchy key is incomplete at position {position}")]
    IncompleteKey { position: usize },
}

/// One component of a hierarchy shape: the table column carrying the key
/// value and the scalar kind it parses into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComponent {
    pub column: String,
    pub kind: ValueKind,
}

impl KeyComponent {
    pub fn new(column: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }
}

/// Which parent instance owns a child row: a single scalar key or a
/// composite tuple of 2 to 6 components.
///
/// The arity is the tree depth of the rows the route owns. Depth-0 routes
/// have no shape at all and never enter matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HierarchyShape {
    Single(KeyComponent),
    Composite(Vec<KeyComponent>),
}

impl HierarchyShape {
    /// Single-key shape for depth-1 rows.
    pub fn single(column: impl Into<String>, kind: ValueKind) -> Self {
        Self::Single(KeyComponent::new(column, kind))
    }

    /// Composite-key shape; arity bounds are enforced by configuration
    /// validation.
    pub fn composite(components: Vec<KeyComponent>) -> Self {
        Self::Composite(components)
    }

    /// Number of key components, which is also the tree depth served.
    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Composite(components) => components.len(),
        }
    }

    /// Components in key order.
    pub fn components(&self) -> &[KeyComponent] {
        match self {
            Self::Single(component) => std::slice::from_ref(component),
            Self::Composite(components) => components,
        }
    }

    /// The column of the deepest (last) component: the table column this
    /// shape contributes to the hierarchy column list.
    pub fn last_column(&self) -> &str {
        let components = self.components();
        &components[components.len() - 1].column
    }

    /// Parse the row key's leading positions into this shape's typed tuple.
    ///
    /// Component `i` reads key position `i`. A value that fails to parse
    /// becomes a null component rather than an error; an unsupported
    /// component kind is fatal.
    pub fn build_identifier(&self, key: &RowKey) -> Result<KeyTuple, RouteError> {
        let mut scalars = Vec::with_capacity(self.arity());

        for (position, component) in self.components().iter().enumerate() {
            let raw = key.components().get(position).and_then(Option::as_deref);
            scalars.push(KeyScalar::parse(component, raw)?);
        }

        Ok(KeyTuple { scalars })
    }
}

/// One parsed hierarchy key component.
///
/// Carries `None` when the cell failed to parse (or was absent); whether a
/// null component is acceptable depends on the shape: single keys pass it
/// through to the callback, composite tuples must be complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyScalar {
    Int(Option<i32>),
    Short(Option<i16>),
    Text(Option<String>),
}

impl KeyScalar {
    fn parse(component: &KeyComponent, raw: Option<&str>) -> Result<Self, RouteError> {
        match component.kind {
            ValueKind::Int => Ok(Self::Int(raw.and_then(|value| value.parse().ok()))),
            ValueKind::Short => Ok(Self::Short(raw.and_then(|value| value.parse().ok()))),
            ValueKind::Text => Ok(Self::Text(raw.map(str::to_string))),
            kind => Err(RouteError::UnsupportedKeyKind {
                column: component.column.clone(),
                kind,
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Int(value) => value.is_none(),
            Self::Short(value) => value.is_none(),
            Self::Text(value) => value.is_none(),
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => *value,
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            Self::Short(value) => *value,
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => value.as_deref(),
            _ => None,
        }
    }
}

/// The typed identifier a matched route hands to its per-row callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTuple {
    scalars: Vec<KeyScalar>,
}

impl KeyTuple {
    /// Components in key order.
    pub fn scalars(&self) -> &[KeyScalar] {
        &self.scalars
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Component at a key position.
    pub fn get(&self, position: usize) -> Option<&KeyScalar> {
        self.scalars.get(position)
    }

    /// Error if any component is null. Required before composite tuples
    /// reach a route callback.
    pub fn ensure_complete(&self) -> Result<(), RouteError> {
        match self.scalars.iter().position(KeyScalar::is_null) {
            Some(position) => Err(RouteError::IncompleteKey { position }),
            None => Ok(()),
        }
    }
}

/// Find the unique route whose shape arity equals the row's present-key
/// count, and build its typed identifier.
///
/// `shapes` holds one entry per configured route in configuration order
/// (`None` for depth-0 routes); the returned index refers back into it.
/// Configuration validation guarantees arities are disjoint, so the first
/// match is the only match.
pub fn find_match(
    shapes: &[Option<&HierarchyShape>],
    key: &RowKey,
) -> Result<(usize, KeyTuple), RouteError> {
    if key.is_empty() {
        return Err(RouteError::EmptyKey);
    }

    let arity = key.present_count();

    for (index, shape) in shapes.iter().enumerate() {
        if let Some(shape) = shape
            && shape.arity() == arity
        {
            return Ok((index, shape.build_identifier(key)?));
        }
    }

    Err(RouteError::NoMatch { arity })
}

/// The ordered hierarchy column list: per shaped route, in configuration
/// order, the column of its deepest component.
pub fn hierarchy_column_names(shapes: &[Option<&HierarchyShape>]) -> Vec<String> {
    shapes
        .iter()
        .filter_map(|shape| shape.map(|shape| shape.last_column().to_string()))
        .collect()
}
