//! Entity seam: the narrow contract standing in for ORM reflection
//!
//! The build and verify paths never inspect concrete entity types. They see
//! a property table (name and kind), read and write properties as [`Value`]s,
//! and hydrate instances from table rows through the functions here.

use super::{ModelError, Table, UNKNOWN_DATE, Value, ValueKind};
use chrono::NaiveDateTime;

/// An ORM entity as the SDK sees it.
///
/// Implementations declare their scalar properties and move values in and
/// out by name. Navigation properties (sub-objects, collections) are not
/// listed here; they are reached through typed closures captured at
/// configuration time.
///
/// # Example
///
/// ```rust
/// use table_fixtures_sdk::models::{Entity, ModelError, Value, ValueKind};
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Customer {
///     id: i32,
///     name: String,
/// }
///
/// impl Entity for Customer {
///     fn properties() -> &'static [(&'static str, ValueKind)] {
///         &[("Id", ValueKind::Int), ("Name", ValueKind::Text)]
///     }
///
///     fn get(&self, property: &str) -> Option<Value> {
///         match property {
///             "Id" => Some(Value::Int(self.id)),
///             "Name" => Some(Value::Text(self.name.clone())),
///             _ => None,
///         }
///     }
///
///     fn set(&mut self, property: &str, value: Value) -> Result<(), ModelError> {
///         match (property, value) {
///             ("Id", Value::Int(id)) => self.id = id,
///             ("Name", Value::Text(name)) => self.name = name,
///             (property, value) => {
///                 return Err(Customer::kind_mismatch(property, value));
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: Default + Clone {
    /// Scalar property table: name and kind, in declaration order.
    fn properties() -> &'static [(&'static str, ValueKind)];

    /// Read a property as a value. `None` when the name is unknown.
    fn get(&self, property: &str) -> Option<Value>;

    /// Write a property from a value.
    fn set(&mut self, property: &str, value: Value) -> Result<(), ModelError>;

    /// Type name used in error messages.
    fn entity_name() -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("entity")
    }

    /// Kind declared for a property, if any.
    fn property_kind(property: &str) -> Option<ValueKind> {
        Self::properties()
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, kind)| *kind)
    }

    /// Convenience for `set` implementations rejecting a (property, value)
    /// pairing.
    fn kind_mismatch(property: &str, value: Value) -> ModelError {
        match Self::property_kind(property) {
            Some(expected) => ModelError::KindMismatch {
                property: property.to_string(),
                expected,
                actual: value.kind().unwrap_or(ValueKind::Text),
            },
            None => ModelError::UnknownProperty {
                entity: Self::entity_name().to_string(),
                property: property.to_string(),
            },
        }
    }
}

/// Hydrate an entity from one table row.
///
/// Every header that names a declared property has its cell parsed per the
/// property's kind and assigned; other headers are ignored, and empty cells
/// leave the default in place.
pub fn hydrate<T: Entity>(table: &Table, row: usize) -> Result<T, ModelError> {
    let cells = table.row(row).ok_or(ModelError::RowOutOfRange { row })?;
    let mut entity = T::default();

    for (index, header) in table.header().iter().enumerate() {
        let Some(kind) = T::property_kind(header) else {
            continue;
        };

        let raw = &cells[index];
        if raw.is_empty() {
            continue;
        }

        entity.set(header, Value::parse(kind, raw)?)?;
    }

    Ok(entity)
}

/// Normalize date/time properties holding the minimum representable value
/// to the [`UNKNOWN_DATE`] sentinel.
pub fn replace_minimum_dates<T: Entity>(entity: &mut T) -> Result<(), ModelError> {
    for (name, kind) in T::properties() {
        if *kind != ValueKind::DateTime {
            continue;
        }

        if let Some(Value::DateTime(current)) = entity.get(name)
            && current == NaiveDateTime::MIN
        {
            entity.set(name, Value::DateTime(*UNKNOWN_DATE))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Shipment {
        reference: String,
        parcels: i32,
        shipped_on: NaiveDateTime,
    }

    impl Default for Shipment {
        fn default() -> Self {
            Self {
                reference: String::new(),
                parcels: 0,
                shipped_on: NaiveDateTime::MIN,
            }
        }
    }

    impl Entity for Shipment {
        fn properties() -> &'static [(&'static str, ValueKind)] {
            &[
                ("Reference", ValueKind::Text),
                ("Parcels", ValueKind::Int),
                ("ShippedOn", ValueKind::DateTime),
            ]
        }

        fn get(&self, property: &str) -> Option<Value> {
            match property {
                "Reference" => Some(Value::Text(self.reference.clone())),
                "Parcels" => Some(Value::Int(self.parcels)),
                "ShippedOn" => Some(Value::DateTime(self.shipped_on)),
                _ => None,
            }
        }

        fn set(&mut self, property: &str, value: Value) -> Result<(), ModelError> {
            match (property, value) {
                ("Reference", Value::Text(reference)) => self.reference = reference,
                ("Parcels", Value::Int(parcels)) => self.parcels = parcels,
                ("ShippedOn", Value::DateTime(shipped_on)) => self.shipped_on = shipped_on,
                (property, value) => return Err(Self::kind_mismatch(property, value)),
            }
            Ok(())
        }
    }

    #[test]
    fn hydrates_matching_headers_and_ignores_the_rest() {
        let table = Table::parse(
            "| Reference | Parcels | Unrelated |
             | S-100     | 3       | ignored   |",
        )
        .unwrap();

        let shipment: Shipment = hydrate(&table, 0).unwrap();

        assert_eq!(shipment.reference, "S-100");
        assert_eq!(shipment.parcels, 3);
        assert_eq!(shipment.shipped_on, NaiveDateTime::MIN);
    }

    #[test]
    fn empty_cells_leave_defaults() {
        let table = Table::parse(
            "| Reference | Parcels |
             | S-200     |         |",
        )
        .unwrap();

        let shipment: Shipment = hydrate(&table, 0).unwrap();

        assert_eq!(shipment.parcels, 0);
    }

    #[test]
    fn minimum_dates_become_the_unknown_date_sentinel() {
        let mut shipment = Shipment::default();

        replace_minimum_dates(&mut shipment).unwrap();

        assert_eq!(shipment.shipped_on, *UNKNOWN_DATE);
    }

    #[test]
    fn kind_mismatch_reports_expected_kind() {
        let mut shipment = Shipment::default();

        let err = shipment.set("Parcels", Value::Text("three".into())).unwrap_err();

        assert!(matches!(
            err,
            ModelError::KindMismatch {
                expected: ValueKind::Int,
                ..
            }
        ));
    }
}
