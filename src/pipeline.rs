//! Validation pipeline
//!
//! Runs the full describe → resolve → check sequence for one statement on
//! one connection. The connection is held exclusively for the duration of a
//! call; the server-side prepared statement is released on every exit path.

use postgres::Client;

use crate::check::{check_record, check_scalar};
use crate::describe::{self, Described};
use crate::error::{Error, ValidationError};
use crate::explain::collect_explain_nullability;
use crate::nullability::{collect_catalog_nullability, resolve};
use crate::placeholders::positional;
use crate::shape::{extract_expected, Expectation, Shape};
use crate::types::TypeCatalog;

/// Drives validation of individual statements against one connection.
pub struct Validator<'c> {
    client: &'c mut Client,
    types: TypeCatalog,
}

impl<'c> Validator<'c> {
    /// A validator over the built-in type catalog.
    pub fn new(client: &'c mut Client) -> Self {
        Self {
            client,
            types: TypeCatalog::builtin(),
        }
    }

    /// A validator over a caller-extended type catalog.
    pub fn with_catalog(client: &'c mut Client, types: TypeCatalog) -> Self {
        Self { client, types }
    }

    /// Validate one statement against its declared shape.
    ///
    /// `%s` placeholders are rewritten to `$n` before preparing. With no
    /// shape the statement is a write: preparing it is the whole check, and
    /// neither the catalog nor the planner is consulted.
    ///
    /// Returns the accumulated mismatches; `Err` is reserved for fatal
    /// failures (bad SQL, unsupported types, lost catalog rows).
    pub fn collect_errors(
        &mut self,
        sql: &str,
        shape: Option<&Shape>,
    ) -> Result<Vec<ValidationError>, Error> {
        let sql = positional(sql);
        let described = describe::describe(self.client, &self.types, &sql)?;

        let Some(shape) = shape else {
            describe::deallocate(self.client, &described.statement)?;
            return Ok(Vec::new());
        };

        let outcome = self.resolve_and_check(&described, shape);
        // Release the statement before surfacing whatever happened above.
        let released = describe::deallocate(self.client, &described.statement);
        let errors = outcome?;
        released?;
        Ok(errors)
    }

    fn resolve_and_check(
        &mut self,
        described: &Described,
        shape: &Shape,
    ) -> Result<Vec<ValidationError>, Error> {
        let catalog = collect_catalog_nullability(self.client, &described.origins)?;
        let explain =
            collect_explain_nullability(self.client, &described.statement, &described.columns)?;
        let resolved = resolve(
            &described.columns,
            &catalog,
            &explain,
            &described.overrides,
        );

        Ok(match extract_expected(shape) {
            Expectation::Scalar(scalar) => check_scalar(&resolved, &scalar),
            Expectation::Record(columns) => check_record(&resolved, &columns),
        })
    }
}

/// One-shot convenience over [`Validator`].
pub fn collect_errors(
    client: &mut Client,
    sql: &str,
    shape: Option<&Shape>,
) -> Result<Vec<ValidationError>, Error> {
    Validator::new(client).collect_errors(sql, shape)
}
