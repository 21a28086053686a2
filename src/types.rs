//! PostgreSQL type catalog
//!
//! Maps type OIDs of the common built-in scalars (and their one-dimensional
//! arrays) to the Rust types a result column decodes into. The catalog is
//! built once and read-only afterwards; extending it means building a new
//! instance with [`TypeCatalog::with_type`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use strum_macros::{EnumIter, IntoStaticStr};

use crate::error::Error;

/// Host-side scalar token for a PostgreSQL base type.
///
/// Integer and float widths stay distinct: an `int2` column decodes into an
/// `i16`, not into some widened "integer". Text-family types (`text`,
/// `varchar`, `bpchar`, `name`, `"char"`, `money`) collapse into [`Scalar::Text`],
/// and `json`/`jsonb` into the opaque [`Scalar::Json`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize,
)]
pub enum Scalar {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "i16")]
    I16,
    #[strum(serialize = "i32")]
    I32,
    #[strum(serialize = "i64")]
    I64,
    /// `oid` columns; `u32` on the Rust side.
    #[strum(serialize = "u32")]
    U32,
    #[strum(serialize = "f32")]
    F32,
    #[strum(serialize = "f64")]
    F64,
    #[strum(serialize = "Decimal")]
    Numeric,
    #[strum(serialize = "String")]
    Text,
    #[strum(serialize = "Vec<u8>")]
    Bytes,
    #[strum(serialize = "NaiveDate")]
    Date,
    #[strum(serialize = "NaiveTime")]
    Time,
    #[strum(serialize = "NaiveDateTime")]
    Timestamp,
    #[strum(serialize = "DateTime<Utc>")]
    TimestampTz,
    #[strum(serialize = "Duration")]
    Interval,
    #[strum(serialize = "Uuid")]
    Uuid,
    /// `json` and `jsonb`; an opaque JSON value.
    #[strum(serialize = "Json")]
    Json,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(<&'static str>::from(self))
    }
}

/// A mapped host type: a scalar, or a one-dimensional array of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HostType {
    Scalar(Scalar),
    Array(Scalar),
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Scalar(s) => write!(f, "{s}"),
            HostType::Array(s) => write!(f, "Vec<{s}>"),
        }
    }
}

impl From<Scalar> for HostType {
    fn from(s: Scalar) -> Self {
        HostType::Scalar(s)
    }
}

/// One catalog entry: a PostgreSQL type and the host type it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgType {
    pub oid: u32,
    pub name: &'static str,
    pub host: HostType,
}

const fn scalar(oid: u32, name: &'static str, s: Scalar) -> PgType {
    PgType {
        oid,
        name,
        host: HostType::Scalar(s),
    }
}

const fn array(oid: u32, name: &'static str, s: Scalar) -> PgType {
    PgType {
        oid,
        name,
        host: HostType::Array(s),
    }
}

/// The built-in scalar and array types. Stable OIDs, see `pg_type.dat`.
const BUILTINS: &[PgType] = &[
    scalar(16, "bool", Scalar::Bool),
    scalar(17, "bytea", Scalar::Bytes),
    scalar(18, "char", Scalar::Text),
    scalar(19, "name", Scalar::Text),
    scalar(20, "int8", Scalar::I64),
    scalar(21, "int2", Scalar::I16),
    scalar(23, "int4", Scalar::I32),
    scalar(25, "text", Scalar::Text),
    scalar(26, "oid", Scalar::U32),
    scalar(114, "json", Scalar::Json),
    scalar(700, "float4", Scalar::F32),
    scalar(701, "float8", Scalar::F64),
    scalar(790, "money", Scalar::Text),
    scalar(1042, "bpchar", Scalar::Text),
    scalar(1043, "varchar", Scalar::Text),
    scalar(1082, "date", Scalar::Date),
    scalar(1083, "time", Scalar::Time),
    scalar(1114, "timestamp", Scalar::Timestamp),
    scalar(1184, "timestamptz", Scalar::TimestampTz),
    scalar(1186, "interval", Scalar::Interval),
    scalar(1700, "numeric", Scalar::Numeric),
    scalar(2950, "uuid", Scalar::Uuid),
    scalar(3802, "jsonb", Scalar::Json),
    array(199, "_json", Scalar::Json),
    array(791, "_money", Scalar::Text),
    array(1000, "_bool", Scalar::Bool),
    array(1001, "_bytea", Scalar::Bytes),
    array(1002, "_char", Scalar::Text),
    array(1003, "_name", Scalar::Text),
    array(1005, "_int2", Scalar::I16),
    array(1007, "_int4", Scalar::I32),
    array(1009, "_text", Scalar::Text),
    array(1014, "_bpchar", Scalar::Text),
    array(1015, "_varchar", Scalar::Text),
    array(1016, "_int8", Scalar::I64),
    array(1021, "_float4", Scalar::F32),
    array(1022, "_float8", Scalar::F64),
    array(1028, "_oid", Scalar::U32),
    array(1115, "_timestamp", Scalar::Timestamp),
    array(1182, "_date", Scalar::Date),
    array(1183, "_time", Scalar::Time),
    array(1185, "_timestamptz", Scalar::TimestampTz),
    array(1187, "_interval", Scalar::Interval),
    array(1231, "_numeric", Scalar::Numeric),
    array(2951, "_uuid", Scalar::Uuid),
    array(3807, "_jsonb", Scalar::Json),
];

/// OID → [`PgType`] lookup table.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    by_oid: HashMap<u32, PgType>,
}

impl TypeCatalog {
    /// Catalog covering the common built-in types.
    pub fn builtin() -> Self {
        Self {
            by_oid: BUILTINS.iter().map(|t| (t.oid, *t)).collect(),
        }
    }

    /// Build a new catalog with one additional (or overridden) entry.
    pub fn with_type(mut self, ty: PgType) -> Self {
        self.by_oid.insert(ty.oid, ty);
        self
    }

    /// Resolve an OID. A miss is fatal: the query produces a column this
    /// catalog cannot map, so no meaningful type check is possible.
    pub fn lookup(&self, oid: u32, column: &str) -> Result<PgType, Error> {
        self.by_oid
            .get(&oid)
            .copied()
            .ok_or_else(|| Error::UnsupportedType {
                oid,
                column: column.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scalar_lookup() {
        let catalog = TypeCatalog::builtin();
        let ty = catalog.lookup(25, "front").unwrap();
        assert_eq!(ty.name, "text");
        assert_eq!(ty.host, HostType::Scalar(Scalar::Text));
    }

    #[test]
    fn builtin_array_lookup() {
        let catalog = TypeCatalog::builtin();
        let ty = catalog.lookup(1007, "ids").unwrap();
        assert_eq!(ty.name, "_int4");
        assert_eq!(ty.host, HostType::Array(Scalar::I32));
    }

    #[test]
    fn unsupported_oid_is_fatal() {
        let catalog = TypeCatalog::builtin();
        // 869 is inet, deliberately not in the builtin table.
        let err = catalog.lookup(869, "addr").unwrap_err();
        match err {
            Error::UnsupportedType { oid, column } => {
                assert_eq!(oid, 869);
                assert_eq!(column, "addr");
            }
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn with_type_extends_without_mutating_builtins() {
        let extended = TypeCatalog::builtin().with_type(PgType {
            oid: 869,
            name: "inet",
            host: HostType::Scalar(Scalar::Text),
        });
        assert!(extended.lookup(869, "addr").is_ok());
        assert!(TypeCatalog::builtin().lookup(869, "addr").is_err());
    }

    #[test]
    fn display_names_render_as_rust_types() {
        assert_eq!(HostType::Scalar(Scalar::I64).to_string(), "i64");
        assert_eq!(HostType::Array(Scalar::Text).to_string(), "Vec<String>");
        assert_eq!(HostType::Scalar(Scalar::TimestampTz).to_string(), "DateTime<Utc>");
    }

    #[test]
    fn every_scalar_has_a_distinct_display_name() {
        use strum::IntoEnumIterator;

        let names: Vec<String> = Scalar::iter().map(|s| s.to_string()).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
    }
}
