//! Literal INSERT generation for identity-preserving bulk loads.
//!
//! # Security
//!
//! Text literals have internal quote characters escaped by doubling them
//! according to SQL standards. Table and column names come from ORM
//! metadata, not from fixture cells.

use super::EntityMapping;
use crate::models::{Entity, Value, ValueKind};

/// Error during SQL literal generation
#[derive(Debug, Clone, thiserror::Error)]
pub enum SqlError {
    /// The value's kind has no literal representation
    #[error("the type {kind} is not handled by the SQL literal formatter")]
    UnhandledType { kind: ValueKind },

    /// The mapping names a property the entity does not expose
    #[error("entity exposes no value for mapped property {property}")]
    MissingProperty { property: String },
}

/// Literal SQL representation of a scalar value.
///
/// Quoted and escaped text, locale-invariant numeric literals, `0`/`1`
/// booleans, `'YYYY-MM-DD HH:MM:SS'` date/times. Kinds outside that table
/// (UUIDs) are fatal.
pub fn sql_literal(value: &Value) -> Result<String, SqlError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Text(text) => Ok(format!("'{}'", text.replace('\'', "''"))),
        Value::Bool(value) => Ok(if *value { "1" } else { "0" }.to_string()),
        Value::Byte(value) => Ok(value.to_string()),
        Value::Short(value) => Ok(value.to_string()),
        Value::Int(value) => Ok(value.to_string()),
        Value::Long(value) => Ok(value.to_string()),
        Value::Double(value) => Ok(value.to_string()),
        Value::DateTime(value) => Ok(format!("'{}'", value.format("%Y-%m-%d %H:%M:%S"))),
        Value::Uuid(_) => Err(SqlError::UnhandledType {
            kind: ValueKind::Uuid,
        }),
    }
}

/// One literal INSERT for an entity, columns ordered per the mapping's
/// property list.
pub fn insert_statement<T: Entity>(
    mapping: &EntityMapping,
    entity: &T,
) -> Result<String, SqlError> {
    let mut columns = Vec::with_capacity(mapping.properties.len());
    let mut values = Vec::with_capacity(mapping.properties.len());

    for (property, column) in &mapping.properties {
        let value = entity
            .get(property)
            .ok_or_else(|| SqlError::MissingProperty {
                property: property.clone(),
            })?;

        columns.push(column.as_str());
        values.push(sql_literal(&value)?);
    }

    Ok(format!(
        "INSERT INTO {}({}) VALUES ({})",
        mapping.table_name,
        columns.join(","),
        values.join(",")
    ))
}

/// One semicolon-joined script inserting every entity, bracketed by
/// `SET IDENTITY_INSERT <table> ON/OFF` when the mapping carries an
/// identity column.
pub fn bulk_insert_script<T: Entity>(
    mapping: &EntityMapping,
    entities: &[T],
) -> Result<String, SqlError> {
    let mut statements = Vec::with_capacity(entities.len() + 2);

    if mapping.has_identity {
        statements.push(format!("SET IDENTITY_INSERT {} ON", mapping.table_name));
    }

    for entity in entities {
        statements.push(insert_statement(mapping, entity)?);
    }

    if mapping.has_identity {
        statements.push(format!("SET IDENTITY_INSERT {} OFF", mapping.table_name));
    }

    Ok(statements
        .iter()
        .map(|statement| format!("{statement};"))
        .collect::<Vec<_>>()
        .join("\n"))
}
