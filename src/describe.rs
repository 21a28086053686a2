//! Statement describer
//!
//! Prepares the target SQL server-side and harvests per-column metadata from
//! the row description: display name (with any trailing `!`/`?` annotation
//! stripped), mapped host type, and origin (relation OID + attribute number).
//!
//! Two prepares happen per statement. A simple-protocol
//! `PREPARE <name> AS <sql>` creates the named statement that
//! `EXPLAIN … EXECUTE` can reference later; an extended-protocol prepare of
//! the same SQL carries the row description. The unnamed one closes itself
//! when dropped, the named one must be released with [`deallocate`] on every
//! exit path.

use std::sync::atomic::{AtomicU64, Ordering};

use postgres::Client;

use crate::error::Error;
use crate::types::{HostType, TypeCatalog};

/// A result column before nullability resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedColumn {
    pub name: String,
    pub host: HostType,
}

/// Where a result column comes from. `table_oid` is zero for computed
/// expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrigin {
    pub name: String,
    pub table_oid: u32,
    pub attnum: i16,
}

/// An explicit nullability assertion, either from an alias annotation or
/// from the EXPLAIN walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullabilityOverride {
    pub name: String,
    pub is_nullable: bool,
}

/// Everything [`describe`] harvests for one statement.
#[derive(Debug)]
pub struct Described {
    /// Server-side name of the prepared statement.
    pub statement: String,
    pub columns: Vec<UnresolvedColumn>,
    pub origins: Vec<ColumnOrigin>,
    pub overrides: Vec<NullabilityOverride>,
}

static STATEMENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Session-unique statement name. The counter is process-wide so two
/// validators on separate connections never collide either.
fn next_statement_name() -> String {
    format!("pqv_s_{}", STATEMENT_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Split a trailing `!` (force non-null) or `?` (force nullable) off a raw
/// column alias. Any other name passes through without an override.
pub fn parse_alias_override(raw: &str) -> (&str, Option<bool>) {
    if let Some(name) = raw.strip_suffix('!') {
        (name, Some(false))
    } else if let Some(name) = raw.strip_suffix('?') {
        (name, Some(true))
    } else {
        (raw, None)
    }
}

/// Prepare `sql` and read back its result-column metadata.
///
/// Statements without result columns (DML without `RETURNING`) describe to
/// empty lists; that is a valid outcome.
pub fn describe(client: &mut Client, types: &TypeCatalog, sql: &str) -> Result<Described, Error> {
    let statement = next_statement_name();
    client.batch_execute(&format!("PREPARE {statement} AS {sql}"))?;

    let meta = match client.prepare(sql) {
        Ok(meta) => meta,
        Err(e) => {
            let _ = deallocate(client, &statement);
            return Err(e.into());
        }
    };

    let mut columns = Vec::with_capacity(meta.columns().len());
    let mut origins = Vec::with_capacity(meta.columns().len());
    let mut overrides = Vec::new();

    for col in meta.columns() {
        let (name, annotated) = parse_alias_override(col.name());
        let host = match types.lookup(col.type_().oid(), name) {
            Ok(ty) => ty.host,
            Err(e) => {
                let _ = deallocate(client, &statement);
                return Err(e);
            }
        };
        columns.push(UnresolvedColumn {
            name: name.to_string(),
            host,
        });
        origins.push(ColumnOrigin {
            name: name.to_string(),
            table_oid: col.table_oid().unwrap_or(0),
            attnum: col.column_id().unwrap_or(0),
        });
        if let Some(is_nullable) = annotated {
            overrides.push(NullabilityOverride {
                name: name.to_string(),
                is_nullable,
            });
        }
    }

    Ok(Described {
        statement,
        columns,
        origins,
        overrides,
    })
}

/// Release a statement created by [`describe`].
pub fn deallocate(client: &mut Client, statement: &str) -> Result<(), Error> {
    client.batch_execute(&format!("DEALLOCATE {statement}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bang_forces_non_null() {
        assert_eq!(parse_alias_override("count!"), ("count", Some(false)));
    }

    #[test]
    fn question_forces_nullable() {
        assert_eq!(parse_alias_override("front?"), ("front", Some(true)));
    }

    #[test]
    fn plain_name_has_no_override() {
        assert_eq!(parse_alias_override("front"), ("front", None));
    }

    #[test]
    fn only_the_trailing_character_counts() {
        // An interior marker is part of the name, not an annotation.
        assert_eq!(parse_alias_override("a!b"), ("a!b", None));
        assert_eq!(parse_alias_override("a?b!"), ("a?b", Some(false)));
    }

    #[test]
    fn statement_names_are_unique() {
        let a = next_statement_name();
        let b = next_statement_name();
        assert_ne!(a, b);
        assert!(a.starts_with("pqv_s_"));
    }
}
