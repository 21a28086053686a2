//! Query templates
//!
//! A [`Template`] interleaves SQL fragments with bound values and renders to
//! plain SQL with `$1..$K` placeholders plus the values in the same order.
//! The rendered SQL never contains the values themselves.

use postgres::types::ToSql;

/// A boxed bind value, usable wherever the client takes `&(dyn ToSql + Sync)`.
pub type SqlParam = Box<dyn ToSql + Sync>;

enum Part {
    Sql(String),
    Bind(SqlParam),
}

/// Builder for parameterized SQL.
///
/// ```no_run
/// use pg_query_vet::template::Template;
///
/// let card_id = 7i32;
/// let rendered = Template::new()
///     .sql("SELECT front FROM cards WHERE id = ")
///     .bind(card_id)
///     .render();
/// assert_eq!(rendered.sql, "SELECT front FROM cards WHERE id = $1");
/// ```
#[derive(Default)]
pub struct Template {
    parts: Vec<Part>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a literal SQL fragment.
    pub fn sql(mut self, fragment: impl Into<String>) -> Self {
        self.parts.push(Part::Sql(fragment.into()));
        self
    }

    /// Append a bound value; it renders as the next `$n`.
    pub fn bind(mut self, value: impl ToSql + Sync + 'static) -> Self {
        self.parts.push(Part::Bind(Box::new(value)));
        self
    }

    /// Assemble the final SQL and the parameter list.
    pub fn render(self) -> Rendered {
        let mut sql = String::new();
        let mut params = Vec::new();
        for part in self.parts {
            match part {
                Part::Sql(fragment) => sql.push_str(&fragment),
                Part::Bind(value) => {
                    params.push(value);
                    sql.push('$');
                    sql.push_str(&params.len().to_string());
                }
            }
        }
        Rendered { sql, params }
    }
}

/// A rendered template: positional-placeholder SQL plus its parameters.
pub struct Rendered {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Rendered {
    /// Parameter references in the form the executor takes.
    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Build a [`Template`] from interleaved string literals and `{expr}` binds:
///
/// ```no_run
/// use pg_query_vet::template;
///
/// let front = "bonjour";
/// let t = template!("SELECT id FROM cards WHERE front = " {front} " LIMIT 1");
/// assert_eq!(t.render().sql, "SELECT id FROM cards WHERE front = $1 LIMIT 1");
/// ```
#[macro_export]
macro_rules! template {
    ($($parts:tt)*) => {
        $crate::__template_parts!($crate::template::Template::new(); $($parts)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __template_parts {
    ($t:expr;) => { $t };
    ($t:expr; $lit:literal $($rest:tt)*) => {
        $crate::__template_parts!($t.sql($lit); $($rest)*)
    };
    ($t:expr; { $e:expr } $($rest:tt)*) => {
        $crate::__template_parts!($t.bind($e); $($rest)*)
    };
}
