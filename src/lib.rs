//! pg-query-vet: Static validator for PostgreSQL queries
//!
//! This library checks SQL statements against declared result shapes using a
//! live database. Each statement is prepared server-side, its result columns
//! are mapped from type OIDs to host types, per-column nullability is
//! resolved from the system catalog, the query plan, and alias annotations,
//! and the outcome is compared with the declared shape. Mismatches come back
//! as structured validation errors, caught at startup instead of at runtime.

pub mod check;
pub mod describe;
pub mod dummy;
pub mod error;
pub mod exec;
pub mod explain;
pub mod nullability;
pub mod pipeline;
pub mod placeholders;
pub mod registry;
pub mod shape;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use dummy::Dummy;
pub use error::{Error, InvalidQuery, ValidationError};
pub use exec::{connect, Execute, Executor, Query, Statement};
pub use pipeline::{collect_errors, Validator};
pub use registry::QueryRegistry;
pub use shape::{Shape, TypeSet};
pub use template::Template;
pub use types::{HostType, PgType, Scalar, TypeCatalog};

// The client this validator drives; re-exported so callers need not pin the
// same version themselves.
pub use postgres;
