//! Configuration validation
//!
//! Validates builder/verifier route configuration before a table is
//! processed: column prefixes and hierarchy columns must be well-formed
//! identifiers, shaped routes must occupy distinct contiguous depths, and
//! no two route prefixes may shadow each other. Catching these up front
//! keeps misconfiguration from surfacing as misrouted rows.

use crate::hierarchy::HierarchyShape;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length for column prefixes
pub const MAX_PREFIX_LENGTH: usize = 128;

/// Maximum length for hierarchy column names
pub const MAX_COLUMN_NAME_LENGTH: usize = 255;

/// Maximum number of components in a composite hierarchy key
pub const MAX_COMPOSITE_ARITY: usize = 6;

static PREFIX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*\.?$").unwrap());

static COLUMN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*$").unwrap());

/// Errors that can occur during route configuration validation.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// A required name was empty
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// A name exceeds its maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// A name contains characters outside the identifier shape
    #[error("{field} {value:?} contains invalid characters")]
    InvalidCharacters { field: &'static str, value: String },

    /// Two routes share a column prefix, or one prefix shadows another
    #[error("column prefix {second:?} overlaps with {first:?}: cell routing would be ambiguous")]
    PrefixOverlap { first: String, second: String },

    /// Two shaped routes serve the same hierarchy depth
    #[error("two collection routes have hierarchy keys of {arity} component(s)")]
    DuplicateArity { arity: usize },

    /// Shaped routes must be configured shallow to deep with no gaps
    #[error("collection route {position} has a hierarchy key of {actual} component(s), expected {expected}")]
    NonContiguousArity {
        position: usize,
        expected: usize,
        actual: usize,
    },

    /// A composite hierarchy key is outside the 2..=6 component range
    #[error("composite hierarchy keys must have 2 to {MAX_COMPOSITE_ARITY} components, got {arity}")]
    CompositeArity { arity: usize },
}

/// Result type for validation operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Validate a collection route's column prefix.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 128 characters
/// - Must be dotted-identifier shaped (a trailing dot is allowed, as in
///   `Line.`)
pub fn validate_column_prefix(prefix: &str) -> ConfigResult<()> {
    if prefix.is_empty() {
        return Err(ConfigError::Empty("column prefix"));
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::TooLong {
            field: "column prefix",
            max: MAX_PREFIX_LENGTH,
            actual: prefix.len(),
        });
    }

    if !PREFIX_PATTERN.is_match(prefix) {
        return Err(ConfigError::InvalidCharacters {
            field: "column prefix",
            value: prefix.to_string(),
        });
    }

    Ok(())
}

/// Validate a hierarchy key column name.
pub fn validate_hierarchy_column(name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::Empty("hierarchy column name"));
    }

    if name.len() > MAX_COLUMN_NAME_LENGTH {
        return Err(ConfigError::TooLong {
            field: "hierarchy column name",
            max: MAX_COLUMN_NAME_LENGTH,
            actual: name.len(),
        });
    }

    if !COLUMN_PATTERN.is_match(name) {
        return Err(ConfigError::InvalidCharacters {
            field: "hierarchy column name",
            value: name.to_string(),
        });
    }

    Ok(())
}

/// Validate a full route configuration: one entry per route, in
/// configuration order, pairing its column prefix with its optional
/// hierarchy shape.
///
/// Shaped routes must have strictly increasing contiguous arities
/// (1, 2, ...) so every tree depth is served by exactly one route; prefixes
/// must not shadow one another.
pub fn validate_routes(routes: &[(&str, Option<&HierarchyShape>)]) -> ConfigResult<()> {
    for (position, (prefix, _)) in routes.iter().enumerate() {
        validate_column_prefix(prefix)?;

        for (earlier, _) in &routes[..position] {
            if prefix.starts_with(earlier) || earlier.starts_with(prefix) {
                return Err(ConfigError::PrefixOverlap {
                    first: (*earlier).to_string(),
                    second: (*prefix).to_string(),
                });
            }
        }
    }

    let mut expected = 1;

    for (prefix_position, (_, shape)) in routes.iter().enumerate() {
        let Some(shape) = shape else {
            continue;
        };

        if let HierarchyShape::Composite(components) = shape
            && !(2..=MAX_COMPOSITE_ARITY).contains(&components.len())
        {
            return Err(ConfigError::CompositeArity {
                arity: components.len(),
            });
        }

        for component in shape.components() {
            validate_hierarchy_column(&component.column)?;
        }

        let arity = shape.arity();
        if arity < expected {
            return Err(ConfigError::DuplicateArity { arity });
        }
        if arity != expected {
            return Err(ConfigError::NonContiguousArity {
                position: prefix_position,
                expected,
                actual: arity,
            });
        }

        expected += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::KeyComponent;
    use crate::models::ValueKind;

    #[test]
    fn accepts_dotted_prefixes_with_trailing_dot() {
        assert!(validate_column_prefix("Line.").is_ok());
        assert!(validate_column_prefix("Line.Allocation.").is_ok());
        assert!(validate_column_prefix("Line").is_ok());
    }

    #[test]
    fn rejects_malformed_prefixes() {
        assert!(matches!(
            validate_column_prefix(""),
            Err(ConfigError::Empty(_))
        ));
        assert!(matches!(
            validate_column_prefix("1Line."),
            Err(ConfigError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_column_prefix("Line..Label"),
            Err(ConfigError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn rejects_shadowing_prefixes() {
        let routes = vec![("Line.", None), ("Line.Allocation.", None)];

        assert!(matches!(
            validate_routes(&routes),
            Err(ConfigError::PrefixOverlap { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_arities() {
        let first = HierarchyShape::single("Line", ValueKind::Int);
        let second = HierarchyShape::single("Other", ValueKind::Int);
        let routes = vec![("Line.", Some(&first)), ("Other.", Some(&second))];

        assert!(matches!(
            validate_routes(&routes),
            Err(ConfigError::DuplicateArity { arity: 1 })
        ));
    }

    #[test]
    fn rejects_depth_gaps() {
        let deep = HierarchyShape::composite(vec![
            KeyComponent::new("Line", ValueKind::Int),
            KeyComponent::new("Allocation", ValueKind::Text),
        ]);
        let routes = vec![("Allocation.", Some(&deep))];

        assert!(matches!(
            validate_routes(&routes),
            Err(ConfigError::NonContiguousArity {
                expected: 1,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn accepts_contiguous_shapes_mixed_with_flat_routes() {
        let line = HierarchyShape::single("Line", ValueKind::Int);
        let allocation = HierarchyShape::composite(vec![
            KeyComponent::new("Line", ValueKind::Int),
            KeyComponent::new("Allocation", ValueKind::Text),
        ]);
        let routes = vec![
            ("Tag.", None),
            ("Line.", Some(&line)),
            ("Allocation.", Some(&allocation)),
        ];

        assert!(validate_routes(&routes).is_ok());
    }
}
