//! SQL dialect rules: identifier and value quoting, LIMIT/OFFSET syntax,
//! boolean rendering, DISTINCT ON and join support.
//!
//! Every supported engine is a unit struct implementing [`Dialect`]. The
//! trait's default methods describe the backtick dialect (MySQL-like); each
//! engine overrides what differs. Use [`DialectKind::dialect`] to get the
//! shared static instance.

mod cubrid;
mod mssql;
mod mysql;
mod pgsql;
mod sqlite;

pub use cubrid::Cubrid;
pub use mssql::Mssql;
pub use mysql::Mysql;
pub use pgsql::Pgsql;
pub use sqlite::Sqlite;

use crate::error::{QueryError, QueryResult};
use crate::lookup::LookupSet;
use crate::query::{Distinct, JoinKind};
use crate::value::Value;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The supported database engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Sqlite,
    Mysql,
    Pgsql,
    Mssql,
    Cubrid,
}

impl DialectKind {
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Sqlite,
        DialectKind::Mysql,
        DialectKind::Pgsql,
        DialectKind::Mssql,
        DialectKind::Cubrid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Sqlite => "sqlite",
            DialectKind::Mysql => "mysql",
            DialectKind::Pgsql => "pgsql",
            DialectKind::Mssql => "mssql",
            DialectKind::Cubrid => "cubrid",
        }
    }

    /// The static dialect instance for this engine.
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::Sqlite => &Sqlite,
            DialectKind::Mysql => &Mysql,
            DialectKind::Pgsql => &Pgsql,
            DialectKind::Mssql => &Mssql,
            DialectKind::Cubrid => &Cubrid,
        }
    }

    /// Resolve a driver name (`sqlite3`, `postgres`, `sqlsrv`, ...).
    pub fn from_driver(driver: &str) -> Option<Self> {
        Some(match driver.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => DialectKind::Sqlite,
            "mysql" | "mysqli" | "mariadb" => DialectKind::Mysql,
            "pgsql" | "postgres" | "postgresql" => DialectKind::Pgsql,
            "sqlsrv" | "mssql" | "dblib" => DialectKind::Mssql,
            "cubrid" => DialectKind::Cubrid,
            _ => return None,
        })
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn pseudo_syntax_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\{\{(%?[\w\-\. ]+%?)\}\}|\[\[([\w\-\. ]+)\]\])")
            .expect("invalid built-in pseudo-syntax regex")
    })
}

/// Per-engine SQL rules.
///
/// Default methods implement the backtick dialect. Implementors must provide
/// [`kind`](Dialect::kind) and [`lookups`](Dialect::lookups).
pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Lookup translations for this engine.
    fn lookups(&self) -> &'static dyn LookupSet;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    // ==================== Quoting ====================

    /// Opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    /// Quote a string literal, doubling embedded single quotes.
    fn quote_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quote a single table name segment. Already quoted names are kept.
    fn quote_simple_table_name(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        if name.contains(open) {
            name.to_string()
        } else {
            format!("{open}{name}{close}")
        }
    }

    /// Quote a single column name segment. `*` is never quoted.
    fn quote_simple_column_name(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        if name == "*" || name.contains(open) {
            name.to_string()
        } else {
            format!("{open}{name}{close}")
        }
    }

    /// Quote a possibly schema-qualified table name.
    ///
    /// Names containing `(`, `[[` or `{{` are expressions or pseudo-syntax
    /// and pass through unchanged.
    fn quote_table_name(&self, name: &str) -> String {
        if name.contains('(') || name.contains("[[") || name.contains("{{") {
            return name.to_string();
        }
        name.split('.')
            .map(|part| self.quote_simple_table_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a possibly table-qualified column name.
    ///
    /// Names containing `(`, `[[` or `{{` pass through unchanged.
    fn quote_column_name(&self, name: &str) -> String {
        if name.contains('(') || name.contains("[[") || name.contains("{{") {
            return name.to_string();
        }
        match name.rsplit_once('.') {
            Some((table, column)) => format!(
                "{}.{}",
                self.quote_table_name(table),
                self.quote_simple_column_name(column)
            ),
            None => self.quote_simple_column_name(name),
        }
    }

    /// Resolve `{{table}}`, `{{%table}}` and `[[column]]` pseudo-syntax.
    ///
    /// `%` inside a table reference is replaced by `table_prefix`.
    fn quote_sql(&self, sql: &str, table_prefix: &str) -> String {
        pseudo_syntax_re()
            .replace_all(sql, |caps: &Captures<'_>| {
                if let Some(column) = caps.get(3) {
                    self.quote_column_name(column.as_str())
                } else {
                    let table = caps.get(2).map_or("", |m| m.as_str());
                    self.quote_table_name(&table.replace('%', table_prefix))
                }
            })
            .into_owned()
    }

    // ==================== Values ====================

    /// Value bound for a native boolean.
    fn bool_value(&self, value: bool) -> Value {
        Value::Int(i64::from(value))
    }

    /// Boolean rendered inline.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn datetime_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    /// Render a value as an SQL literal (inline mode).
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.bool_literal(*b).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => self.quote_value(s),
            Value::DateTime(dt) => self.quote_value(&dt.format(self.datetime_format()).to_string()),
            Value::Date(d) => self.quote_value(&d.format("%Y-%m-%d").to_string()),
        }
    }

    // ==================== Clauses ====================

    fn random_function(&self) -> &'static str {
        "RAND()"
    }

    /// Suffix appended after a backslash-escaped LIKE pattern.
    fn like_escape(&self) -> &'static str {
        ""
    }

    /// Operator used for case-insensitive LIKE conditions.
    fn ilike_operator(&self) -> &'static str {
        "LIKE"
    }

    /// Whether `(a, b) IN ((1, 2), ...)` is understood.
    fn supports_row_value_in(&self) -> bool {
        true
    }

    /// Whether UNION operands are wrapped in parentheses.
    fn parenthesize_union(&self) -> bool {
        true
    }

    /// `LIMIT` used when only an offset is given, if the engine needs one.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Render the LIMIT/OFFSET clause. A zero offset is omitted.
    fn build_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let offset = offset.filter(|o| *o > 0);
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => match self.unbounded_limit() {
                Some(max) => format!("LIMIT {max} OFFSET {o}"),
                None => format!("OFFSET {o}"),
            },
            (None, None) => String::new(),
        }
    }

    /// Render the DISTINCT keyword (empty for [`Distinct::No`]).
    fn build_distinct(&self, distinct: &Distinct) -> QueryResult<String> {
        match distinct {
            Distinct::No => Ok(String::new()),
            Distinct::All => Ok("DISTINCT".to_string()),
            Distinct::On(_) => Err(QueryError::not_supported(self.name(), "DISTINCT ON")),
        }
    }

    /// Reject join types the engine cannot express.
    fn check_join(&self, _kind: &JoinKind) -> QueryResult<()> {
        Ok(())
    }

    fn truncate_table(&self, quoted_table: &str) -> String {
        format!("TRUNCATE TABLE {quoted_table}")
    }

    /// Wrap a SELECT so that it yields a single truthy/falsy cell.
    fn select_exists(&self, sql: &str) -> String {
        format!("SELECT EXISTS({sql})")
    }

    /// INSERT statement for a row with no explicit columns.
    fn default_values_insert(&self, quoted_table: &str) -> String {
        format!("INSERT INTO {quoted_table} DEFAULT VALUES")
    }
}
