//! Nullability resolution
//!
//! Three sources feed one boolean per result column, in rising precedence:
//! the `pg_attribute.attnotnull` base for columns with a real origin, the
//! EXPLAIN-derived outer-join overrides, and the user's alias annotations.

use std::collections::HashMap;

use postgres::Client;

use crate::describe::{ColumnOrigin, NullabilityOverride, UnresolvedColumn};
use crate::error::Error;
use crate::types::HostType;

/// Catalog-level nullability of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nullable {
    pub name: String,
    pub nullable: bool,
}

/// A result column after type mapping and nullability merge, ready for
/// checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: String,
    pub host: HostType,
    pub nullable: bool,
}

/// Look up `attnotnull` for every column with a table origin.
///
/// Columns with `table_oid = 0` are computed expressions; with no catalog row
/// to consult they are assumed nullable. A missing `pg_attribute` row for a
/// real origin is fatal: the row description named a relation/attribute pair
/// the catalog no longer has.
pub fn collect_catalog_nullability(
    client: &mut Client,
    origins: &[ColumnOrigin],
) -> Result<Vec<Nullable>, Error> {
    let mut out = Vec::with_capacity(origins.len());

    for origin in origins {
        if origin.table_oid == 0 {
            out.push(Nullable {
                name: origin.name.clone(),
                nullable: true,
            });
            continue;
        }

        let row = client
            .query_opt(
                "SELECT attnotnull FROM pg_catalog.pg_attribute \
                 WHERE attrelid = $1 AND attnum = $2",
                &[&origin.table_oid, &origin.attnum],
            )?
            .ok_or(Error::MissingAttribute {
                table_oid: origin.table_oid,
                attnum: origin.attnum,
            })?;
        let attnotnull: bool = row.try_get(0)?;
        out.push(Nullable {
            name: origin.name.clone(),
            nullable: !attnotnull,
        });
    }

    Ok(out)
}

/// Merge the three sources into resolved columns.
///
/// The catalog seeds a name → nullable map, explain overrides overlay it,
/// and alias annotations overlay both. Explain only ever flips a column *to*
/// nullable; annotations win in either direction.
pub fn resolve(
    columns: &[UnresolvedColumn],
    catalog: &[Nullable],
    explain: &[NullabilityOverride],
    annotations: &[NullabilityOverride],
) -> Vec<ResolvedColumn> {
    let mut by_name: HashMap<&str, bool> = catalog
        .iter()
        .map(|n| (n.name.as_str(), n.nullable))
        .collect();
    for o in explain {
        by_name.insert(o.name.as_str(), o.is_nullable);
    }
    for o in annotations {
        by_name.insert(o.name.as_str(), o.is_nullable);
    }

    columns
        .iter()
        .map(|col| ResolvedColumn {
            name: col.name.clone(),
            host: col.host,
            // Origins and columns are produced together, so every name is
            // seeded; unknown still defaults to nullable.
            nullable: by_name.get(col.name.as_str()).copied().unwrap_or(true),
        })
        .collect()
}
