//! Error types
//!
//! Two disjoint taxonomies. [`ValidationError`] values are *returned*,
//! accumulated in a `Vec` by `collect_errors`; they describe a mismatch
//! between a query and its declared shape. [`Error`] is *propagated*: database
//! failures, unmappable types, and broken internal invariants that make the
//! validation itself meaningless.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::HostType;

/// A single query/shape mismatch found by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    /// A scalar shape was declared but the query produced a different number
    /// of result columns.
    ColumnCountMismatch { expected: usize, actual: usize },
    /// A declared field has no result column of the same name.
    ColumnNotFound { column: String },
    /// The column's mapped type is not in the declared allowed set.
    TypeMismatch {
        column: String,
        expected: Vec<HostType>,
        actual: HostType,
    },
    /// The column resolved nullable but the declared type does not admit null.
    Nullability { column: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ColumnCountMismatch { expected, actual } => {
                write!(f, "expected {expected} column(s), got {actual}")
            }
            ValidationError::ColumnNotFound { column } => {
                write!(f, "column {column:?} not found in query results")
            }
            ValidationError::TypeMismatch {
                column,
                expected,
                actual,
            } => {
                write!(f, "column {column:?}: expected ")?;
                for (i, ty) in expected.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ", got {actual}")
            }
            ValidationError::Nullability { column } => {
                write!(f, "column {column:?} is nullable but type does not allow null")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A [`ValidationError`] annotated with the query it came from.
///
/// Built by the registry layer when it promotes the first accumulated error
/// into a failure; the inner error is wrapped, never mutated.
#[derive(Debug, Error)]
#[error("query {query_name:?} failed validation: {error} — {sql}")]
pub struct InvalidQuery {
    pub query_name: String,
    pub sql: String,
    #[source]
    pub error: ValidationError,
}

/// Fatal failures raised out of the validation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The query produced a column whose type OID is not in the catalog.
    #[error("unsupported PostgreSQL type OID {oid} for column {column:?}")]
    UnsupportedType { oid: u32, column: String },

    /// Anything PostgreSQL itself rejected: bad SQL, missing table, broken
    /// connection.
    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    /// EXPLAIN produced JSON we could not interpret as a plan tree.
    #[error("malformed EXPLAIN plan: {0}")]
    MalformedPlan(#[from] serde_json::Error),

    /// `pg_attribute` has no row for an origin the row description reported.
    /// Indicates the schema changed mid-validation.
    #[error("pg_attribute row not found for relation {table_oid}, attnum {attnum}")]
    MissingAttribute { table_oid: u32, attnum: i16 },

    /// `pg_prepared_statements` has no row for our own statement; it went
    /// missing between PREPARE and EXPLAIN.
    #[error("pg_prepared_statements row not found for statement {statement:?}")]
    MissingPreparedStatement { statement: String },

    /// EXPLAIN returned zero rows.
    #[error("EXPLAIN returned no rows")]
    EmptyExplain,

    /// `fetch_one` against a query that returned no rows.
    #[error("fetch_one: query returned no rows")]
    NoRows,

    /// First validation failure, promoted by the registry after logging.
    #[error(transparent)]
    Invalid(#[from] Box<InvalidQuery>),
}
