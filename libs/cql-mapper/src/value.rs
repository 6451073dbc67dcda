//! Conversions between Rust field types and driver values.
//!
//! Entities are bound and decoded through [`CqlValue`] so that one generic
//! DAO can serve every table. `CqlType` supplies the DDL type name used by
//! schema bootstrap.

use std::collections::HashSet;
use std::hash::BuildHasher;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{MapperError, Result};

pub use scylla::value::{CqlTimestamp, CqlValue, MaybeUnset, Row};

/// A value bound to a prepared statement; `Unset` leaves the column untouched.
pub type BoundValue = MaybeUnset<Option<CqlValue>>;

/// CQL type name of a mapped field, as written in `CREATE TABLE`.
pub trait CqlType {
    const CQL_TYPE: &'static str;
}

/// Converts a field into a driver value. `None` means CQL `null`.
pub trait ToCql {
    fn to_cql(&self) -> Option<CqlValue>;
}

/// Decodes a driver value (or `null`) read from `column`.
pub trait FromCql: Sized {
    /// # Errors
    /// Returns `MapperError::Conversion` when the value has another CQL type,
    /// or is `null` for a non-optional field.
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self>;
}

fn mismatch(column: &str, expected: &'static str, found: Option<&CqlValue>) -> MapperError {
    MapperError::Conversion {
        column: column.to_owned(),
        expected,
        found: found.map_or("null", kind_name).to_owned(),
    }
}

/// Short CQL type name of a value, used in conversion errors.
#[must_use]
pub fn kind_name(value: &CqlValue) -> &'static str {
    match value {
        CqlValue::Ascii(_) => "ascii",
        CqlValue::Text(_) => "text",
        CqlValue::Boolean(_) => "boolean",
        CqlValue::Int(_) => "int",
        CqlValue::BigInt(_) => "bigint",
        CqlValue::SmallInt(_) => "smallint",
        CqlValue::TinyInt(_) => "tinyint",
        CqlValue::Float(_) => "float",
        CqlValue::Double(_) => "double",
        CqlValue::Uuid(_) => "uuid",
        CqlValue::Timeuuid(_) => "timeuuid",
        CqlValue::Timestamp(_) => "timestamp",
        CqlValue::Blob(_) => "blob",
        CqlValue::Set(_) => "set",
        CqlValue::List(_) => "list",
        CqlValue::Map(_) => "map",
        CqlValue::Empty => "empty",
        _ => "unsupported type",
    }
}

macro_rules! scalar_mapping {
    ($ty:ty, $cql:literal, $variant:ident) => {
        impl CqlType for $ty {
            const CQL_TYPE: &'static str = $cql;
        }

        impl ToCql for $ty {
            fn to_cql(&self) -> Option<CqlValue> {
                Some(CqlValue::$variant(*self))
            }
        }

        impl FromCql for $ty {
            fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
                match value {
                    Some(CqlValue::$variant(v)) => Ok(v),
                    other => Err(mismatch(column, $cql, other.as_ref())),
                }
            }
        }
    };
}

scalar_mapping!(i32, "int", Int);
scalar_mapping!(i64, "bigint", BigInt);
scalar_mapping!(bool, "boolean", Boolean);
scalar_mapping!(Uuid, "uuid", Uuid);

impl CqlType for String {
    const CQL_TYPE: &'static str = "text";
}

impl ToCql for String {
    fn to_cql(&self) -> Option<CqlValue> {
        Some(CqlValue::Text(self.clone()))
    }
}

impl FromCql for String {
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Text(v) | CqlValue::Ascii(v)) => Ok(v),
            other => Err(mismatch(column, "text", other.as_ref())),
        }
    }
}

impl CqlType for DateTime<Utc> {
    const CQL_TYPE: &'static str = "timestamp";
}

impl ToCql for DateTime<Utc> {
    fn to_cql(&self) -> Option<CqlValue> {
        Some(CqlValue::Timestamp(CqlTimestamp(self.timestamp_millis())))
    }
}

impl FromCql for DateTime<Utc> {
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
        match value {
            Some(CqlValue::Timestamp(CqlTimestamp(millis))) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| MapperError::Conversion {
                    column: column.to_owned(),
                    expected: "timestamp",
                    found: format!("out of range timestamp {millis}"),
                }),
            other => Err(mismatch(column, "timestamp", other.as_ref())),
        }
    }
}

// CQL stores an empty collection as null, so null decodes to an empty one.

impl<S> CqlType for HashSet<String, S> {
    const CQL_TYPE: &'static str = "set<text>";
}

impl<S: BuildHasher> ToCql for HashSet<String, S> {
    fn to_cql(&self) -> Option<CqlValue> {
        let mut items: Vec<&String> = self.iter().collect();
        items.sort();
        Some(CqlValue::Set(
            items.into_iter().map(|s| CqlValue::Text(s.clone())).collect(),
        ))
    }
}

impl<S: BuildHasher + Default> FromCql for HashSet<String, S> {
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
        match value {
            None => Ok(Self::default()),
            Some(CqlValue::Set(items)) => items
                .into_iter()
                .map(|item| String::from_cql(column, Some(item)))
                .collect(),
            Some(other) => Err(mismatch(column, "set<text>", Some(&other))),
        }
    }
}

impl CqlType for Vec<String> {
    const CQL_TYPE: &'static str = "list<text>";
}

impl ToCql for Vec<String> {
    fn to_cql(&self) -> Option<CqlValue> {
        Some(CqlValue::List(
            self.iter().map(|s| CqlValue::Text(s.clone())).collect(),
        ))
    }
}

impl FromCql for Vec<String> {
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
        match value {
            None => Ok(Self::new()),
            Some(CqlValue::List(items)) => items
                .into_iter()
                .map(|item| String::from_cql(column, Some(item)))
                .collect(),
            Some(other) => Err(mismatch(column, "list<text>", Some(&other))),
        }
    }
}

impl<T: CqlType> CqlType for Option<T> {
    const CQL_TYPE: &'static str = T::CQL_TYPE;
}

impl<T: ToCql> ToCql for Option<T> {
    fn to_cql(&self) -> Option<CqlValue> {
        self.as_ref().and_then(ToCql::to_cql)
    }
}

impl<T: FromCql> FromCql for Option<T> {
    fn from_cql(column: &str, value: Option<CqlValue>) -> Result<Self> {
        value.map(|v| T::from_cql(column, Some(v))).transpose()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_option_none_is_null() {
        let description: Option<String> = None;
        assert!(description.to_cql().is_none());
        assert_eq!(
            Option::<String>::from_cql("description", None).unwrap(),
            None
        );
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(1_i32.to_cql(), Some(CqlValue::Int(1)));
        assert_eq!(i32::from_cql("id", Some(CqlValue::Int(7))).unwrap(), 7);
        assert_eq!(
            String::from_cql("name", Some(CqlValue::Ascii("abc".to_owned()))).unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_type_mismatch_reports_column_and_types() {
        let err = i32::from_cql("id", Some(CqlValue::Text("1".to_owned()))).unwrap_err();
        match err {
            MapperError::Conversion {
                column,
                expected,
                found,
            } => {
                assert_eq!(column, "id");
                assert_eq!(expected, "int");
                assert_eq!(found, "text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_for_required_field_is_rejected() {
        let err = i32::from_cql("id", None).unwrap_err();
        assert!(err.to_string().contains("found null"), "{err}");
    }

    #[test]
    fn test_timestamp_keeps_millisecond_precision() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let value = at.to_cql();
        assert_eq!(
            value,
            Some(CqlValue::Timestamp(CqlTimestamp(1_700_000_000_123)))
        );
        assert_eq!(DateTime::<Utc>::from_cql("added_date", value).unwrap(), at);
    }

    #[test]
    fn test_null_collection_is_empty() {
        assert!(<HashSet<String>>::from_cql("tags", None).unwrap().is_empty());
        assert!(<Vec<String>>::from_cql("tags", None).unwrap().is_empty());
    }

    #[test]
    fn test_set_binding_is_sorted() {
        let tags: HashSet<String> = ["b", "a"].into_iter().map(str::to_owned).collect();
        assert_eq!(
            tags.to_cql(),
            Some(CqlValue::Set(vec![
                CqlValue::Text("a".to_owned()),
                CqlValue::Text("b".to_owned())
            ]))
        );
    }

    #[test]
    fn test_ddl_type_names() {
        assert_eq!(<Option<String> as CqlType>::CQL_TYPE, "text");
        assert_eq!(<HashSet<String> as CqlType>::CQL_TYPE, "set<text>");
        assert_eq!(<DateTime<Utc> as CqlType>::CQL_TYPE, "timestamp");
    }
}
