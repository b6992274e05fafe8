//! Scalar cell values and the canonical-default predicate table

use super::ModelError;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sentinel for "unknown date": date/time properties holding the minimum
/// representable value are normalized to this, and it doubles as the
/// canonical default a `default_value` rule checks against.
pub static UNKNOWN_DATE: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .expect("valid sentinel date")
        .and_hms_opt(0, 0, 0)
        .expect("valid sentinel time")
});

/// Kind tag for [`Value`], used in entity property tables and cell parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Double,
    Text,
    DateTime,
    Uuid,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Text => "text",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A typed scalar cell value.
///
/// This is the closed union the SDK moves between table cells, entity
/// properties, lookup criteria, and SQL literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    /// Kind of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Byte(_) => Some(ValueKind::Byte),
            Self::Short(_) => Some(ValueKind::Short),
            Self::Int(_) => Some(ValueKind::Int),
            Self::Long(_) => Some(ValueKind::Long),
            Self::Double(_) => Some(ValueKind::Double),
            Self::Text(_) => Some(ValueKind::Text),
            Self::DateTime(_) => Some(ValueKind::DateTime),
            Self::Uuid(_) => Some(ValueKind::Uuid),
        }
    }

    /// Parse a raw table cell into a value of the given kind.
    ///
    /// Date/time cells accept `%Y-%m-%d %H:%M:%S` or a bare `%Y-%m-%d`
    /// (midnight). Booleans accept `true`/`false`/`1`/`0`.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self, ModelError> {
        let parse_error = || ModelError::Parse {
            kind,
            raw: raw.to_string(),
        };

        match kind {
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Self::Bool(true)),
                "false" | "0" => Ok(Self::Bool(false)),
                _ => Err(parse_error()),
            },
            ValueKind::Byte => raw.parse().map(Self::Byte).map_err(|_| parse_error()),
            ValueKind::Short => raw.parse().map(Self::Short).map_err(|_| parse_error()),
            ValueKind::Int => raw.parse().map(Self::Int).map_err(|_| parse_error()),
            ValueKind::Long => raw.parse().map(Self::Long).map_err(|_| parse_error()),
            ValueKind::Double => raw.parse().map(Self::Double).map_err(|_| parse_error()),
            ValueKind::Text => Ok(Self::Text(raw.to_string())),
            ValueKind::DateTime => {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| {
                        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                            .map(|date| date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
                    })
                    .map(Self::DateTime)
                    .map_err(|_| parse_error())
            }
            ValueKind::Uuid => Uuid::parse_str(raw).map(Self::Uuid).map_err(|_| parse_error()),
        }
    }

    /// Whether this value is its kind's canonical default/sentinel.
    ///
    /// The explicit per-kind table: null, `false`, numeric zero, empty text,
    /// the [`UNKNOWN_DATE`] sentinel, and the nil UUID.
    pub fn is_canonical_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(value) => !value,
            Self::Byte(value) => *value == 0,
            Self::Short(value) => *value == 0,
            Self::Int(value) => *value == 0,
            Self::Long(value) => *value == 0,
            Self::Double(value) => *value == 0.0,
            Self::Text(value) => value.is_empty(),
            Self::DateTime(value) => *value == *UNKNOWN_DATE,
            Self::Uuid(value) => value.is_nil(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}"),
            Self::Short(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Self::Uuid(value) => write!(f, "{value}"),
        }
    }
}

/// Canonical default for a property's Rust type, used by `default_value`
/// and `calculated_value` rules to decide whether a property is still
/// "unset".
///
/// Mirrors [`Value::is_canonical_default`] at the typed level: numeric zero,
/// empty string, `false`, `None`, the [`UNKNOWN_DATE`] sentinel, nil UUID.
pub trait CanonicalDefault: PartialEq + Sized {
    fn canonical_default() -> Self;

    fn is_canonical_default(&self) -> bool {
        *self == Self::canonical_default()
    }
}

macro_rules! canonical_zero {
    ($($ty:ty),*) => {
        $(impl CanonicalDefault for $ty {
            fn canonical_default() -> Self {
                0 as $ty
            }
        })*
    };
}

canonical_zero!(u8, i16, i32, i64, f64);

impl CanonicalDefault for bool {
    fn canonical_default() -> Self {
        false
    }
}

impl CanonicalDefault for String {
    fn canonical_default() -> Self {
        String::new()
    }
}

impl CanonicalDefault for NaiveDateTime {
    fn canonical_default() -> Self {
        *UNKNOWN_DATE
    }
}

impl CanonicalDefault for Uuid {
    fn canonical_default() -> Self {
        Self::nil()
    }
}

impl<T: PartialEq> CanonicalDefault for Option<T> {
    fn canonical_default() -> Self {
        None
    }
}
