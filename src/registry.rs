//! Query registry
//!
//! The outermost shell: applications register their query-producing
//! functions once, then call [`QueryRegistry::validate_all`] at startup (or
//! from a pre-commit check) to validate every registered statement against a
//! live database in one pass.

use postgres::Client;

use crate::error::{Error, InvalidQuery};
use crate::exec::{connect, Statement};
use crate::pipeline::Validator;

struct Entry {
    name: String,
    produce: Box<dyn Fn() -> Statement>,
}

/// Collects query producers for batch validation.
#[derive(Default)]
pub struct QueryRegistry {
    entries: Vec<Entry>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer under a reporting name (conventionally the
    /// function name; [`register_queries!`](crate::register_queries) does
    /// exactly that and synthesizes dummy arguments).
    pub fn register(&mut self, name: impl Into<String>, produce: impl Fn() -> Statement + 'static) {
        self.entries.push(Entry {
            name: name.into(),
            produce: Box::new(produce),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every registered query, in registration order.
    ///
    /// Returns the number of validated queries. On the first failing query,
    /// all of its errors are logged at warn, then the first is promoted to
    /// [`Error::Invalid`] carrying the query name and rendered SQL. With
    /// `verbose` each passing query logs one `ok:` line at info.
    pub fn validate_all(&self, client: &mut Client, verbose: bool) -> Result<usize, Error> {
        let mut validator = Validator::new(client);
        let mut count = 0;

        for entry in &self.entries {
            let statement = (entry.produce)();
            let sql_oneline = one_line(statement.sql());

            let errors = validator.collect_errors(statement.sql(), statement.shape())?;
            for error in &errors {
                log::warn!("ERR: {} — {} — {}", entry.name, error, sql_oneline);
            }
            if let Some(first) = errors.into_iter().next() {
                return Err(Error::Invalid(Box::new(InvalidQuery {
                    query_name: entry.name.clone(),
                    sql: statement.sql().to_string(),
                    error: first,
                })));
            }

            if verbose {
                log::info!("ok: {} — {}", entry.name, sql_oneline);
            }
            count += 1;
        }

        Ok(count)
    }

    /// Like [`validate_all`](Self::validate_all), but owns the connection:
    /// opens it from the DSN and closes it when done, pass or fail.
    pub fn validate_url(&self, dsn: &str, verbose: bool) -> Result<usize, Error> {
        let mut client = connect(dsn)?;
        self.validate_all(&mut client, verbose)
    }
}

fn one_line(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Register producer functions by name, synthesizing a
/// [`Dummy`](crate::dummy::Dummy) argument per declared parameter type:
///
/// ```no_run
/// use pg_query_vet::exec::{Execute, Query};
/// use pg_query_vet::registry::QueryRegistry;
/// use pg_query_vet::shape::{Shape, TypeSet};
/// use pg_query_vet::types::Scalar;
/// use pg_query_vet::register_queries;
///
/// fn card_front(id: i32) -> Query {
///     Query::new(
///         "SELECT front FROM cards WHERE id = $1",
///         Shape::scalar(TypeSet::of(Scalar::Text)),
///     )
///     .bind(id)
/// }
///
/// fn add_card(front: String, back: String) -> Execute {
///     Execute::new("INSERT INTO cards (front, back) VALUES ($1, $2)")
///         .bind(front)
///         .bind(back)
/// }
///
/// let mut registry = QueryRegistry::new();
/// register_queries!(registry, card_front(i32), add_card(String, String));
/// ```
#[macro_export]
macro_rules! register_queries {
    ($registry:expr, $($name:ident($($param:ty),* $(,)?)),+ $(,)?) => {
        $(
            $registry.register(stringify!($name), || {
                $crate::exec::Statement::from(
                    $name($(<$param as $crate::dummy::Dummy>::dummy()),*),
                )
            });
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{Execute, Query};
    use crate::shape::{Shape, TypeSet};
    use crate::types::Scalar;

    fn list_cards() -> Query {
        Query::new(
            "SELECT front FROM cards ORDER BY id",
            Shape::scalar(TypeSet::of(Scalar::Text)),
        )
    }

    fn add_card(front: String, back: String) -> Execute {
        Execute::new("INSERT INTO cards (front, back) VALUES ($1, $2)")
            .bind(front)
            .bind(back)
    }

    #[test]
    fn macro_registers_under_the_function_name() {
        let mut registry = QueryRegistry::new();
        register_queries!(registry, list_cards(), add_card(String, String));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entries[0].name, "list_cards");
        assert_eq!(registry.entries[1].name, "add_card");
    }

    #[test]
    fn producers_run_with_synthesized_arguments() {
        let mut registry = QueryRegistry::new();
        register_queries!(registry, add_card(String, String));
        let statement = (registry.entries[0].produce)();
        assert_eq!(
            statement.sql(),
            "INSERT INTO cards (front, back) VALUES ($1, $2)"
        );
        assert!(statement.shape().is_none());
    }

    #[test]
    fn one_line_collapses_whitespace() {
        assert_eq!(
            one_line("SELECT id\n  FROM cards\n  WHERE id = $1"),
            "SELECT id FROM cards WHERE id = $1"
        );
    }
}
