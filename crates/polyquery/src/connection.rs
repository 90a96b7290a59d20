//! Connection abstraction and statement execution.
//!
//! polyquery does not ship drivers. A driver implements [`Connection`]
//! (`execute` and `query` over named parameters) and everything else, from
//! quoting to building to running a [`Query`](crate::Query), goes through
//! the trait.

use crate::builder::{Built, QueryBuilder};
use crate::config::DatabaseConfig;
use crate::dialect::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::params::Params;
use crate::schema::Schema;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One result row, column name to value, in select order.
pub type Row = IndexMap<String, Value>;

/// A database connection as seen by the query builder.
pub trait Connection: Send + Sync {
    fn dialect(&self) -> &'static dyn Dialect;

    /// Substituted for `%` in `{{%table}}` references.
    fn table_prefix(&self) -> &str {
        ""
    }

    /// Schema metadata used to typecast INSERT/UPDATE values.
    fn schema(&self) -> Option<&dyn Schema> {
        None
    }

    /// Render values as literals instead of binding them.
    fn inline_values(&self) -> bool {
        false
    }

    fn quote_value(&self, value: &str) -> String {
        self.dialect().quote_value(value)
    }

    fn quote_table_name(&self, name: &str) -> String {
        self.dialect().quote_table_name(name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        self.dialect().quote_column_name(name)
    }

    /// Resolve `{{table}}` / `[[column]]` pseudo-syntax with this connection's prefix.
    fn quote_sql(&self, sql: &str) -> String {
        self.dialect().quote_sql(sql, self.table_prefix())
    }

    /// A builder for this connection's dialect, carrying its schema.
    fn query_builder(&self) -> QueryBuilder<'_> {
        let qb = QueryBuilder::new(self.dialect()).inline_values(self.inline_values());
        match self.schema() {
            Some(schema) => qb.with_schema(schema),
            None => qb,
        }
    }

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &Params) -> QueryResult<u64>;

    /// Run a statement and return all rows.
    fn query(&self, sql: &str, params: &Params) -> QueryResult<Vec<Row>>;
}

// ==================== Command ====================

/// A statement bound to a connection, ready to run.
pub struct Command<'c> {
    conn: &'c dyn Connection,
    sql: String,
    params: Params,
}

impl fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("dialect", &self.conn.dialect().name())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}

impl<'c> Command<'c> {
    pub fn new(conn: &'c dyn Connection, sql: impl Into<String>) -> Self {
        Self {
            conn,
            sql: sql.into(),
            params: Params::new(),
        }
    }

    pub fn from_built(conn: &'c dyn Connection, built: Built) -> Self {
        Self {
            conn,
            sql: built.sql,
            params: built.params.unwrap_or_default(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params.extend(&params);
        self
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// The SQL text as sent to the connection.
    pub fn sql(&self) -> String {
        self.conn.quote_sql(&self.sql)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The SQL with parameters interpolated as literals. For logging only.
    ///
    /// Longer names are replaced first so `:id1` never clobbers `:id10`.
    pub fn raw_sql(&self) -> String {
        let dialect = self.conn.dialect();
        let mut names: Vec<(&str, &Value)> = self.params.iter().collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let mut sql = self.sql();
        for (name, value) in names {
            sql = sql.replace(name, &dialect.literal(value));
        }
        sql
    }

    fn log(&self, _operation: &str, _sql: &str) {
        #[cfg(feature = "tracing")]
        crate::trace::SqlTracer::default().emit(
            self.conn.dialect().name(),
            _operation,
            _sql,
            self.params.len(),
        );
    }

    /// Run as a non-query statement.
    pub fn execute(&self) -> QueryResult<u64> {
        let sql = self.sql();
        self.log("execute", &sql);
        self.conn.execute(&sql, &self.params)
    }

    pub fn query_all(&self) -> QueryResult<Vec<Row>> {
        let sql = self.sql();
        self.log("query", &sql);
        self.conn.query(&sql, &self.params)
    }

    /// First row, if any.
    pub fn query_one(&self) -> QueryResult<Option<Row>> {
        Ok(self.query_all()?.into_iter().next())
    }

    /// First column of the first row.
    pub fn query_scalar(&self) -> QueryResult<Option<Value>> {
        Ok(self
            .query_one()?
            .and_then(|row| row.into_iter().next().map(|(_, v)| v)))
    }

    /// First column of every row.
    pub fn query_column(&self) -> QueryResult<Vec<Value>> {
        Ok(self
            .query_all()?
            .into_iter()
            .filter_map(|row| row.into_iter().next().map(|(_, v)| v))
            .collect())
    }
}

// ==================== ConnectionRegistry ====================

/// Named connections with a default.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, Arc<dyn Connection>>,
    default: Option<String>,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.connections.keys().collect();
        names.sort();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &names)
            .field("default", &self.default)
            .finish()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. The first one registered becomes the default.
    pub fn register(&mut self, name: impl Into<String>, conn: Arc<dyn Connection>) {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.connections.insert(name, conn);
    }

    pub fn with_connection(mut self, name: impl Into<String>, conn: Arc<dyn Connection>) -> Self {
        self.register(name, conn);
        self
    }

    pub fn set_default(&mut self, name: impl Into<String>) -> QueryResult<()> {
        let name = name.into();
        if !self.connections.contains_key(&name) {
            return Err(QueryError::UnknownConnection(name));
        }
        self.default = Some(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> QueryResult<Arc<dyn Connection>> {
        self.connections
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownConnection(name.to_string()))
    }

    pub fn default_connection(&self) -> QueryResult<Arc<dyn Connection>> {
        match &self.default {
            Some(name) => self.get(name),
            None => Err(QueryError::UnknownConnection("<default>".to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Open every configured connection through `factory`.
    ///
    /// The factory receives the connection name, its config and the dialect
    /// derived from the DSN.
    pub fn from_config<F>(config: &DatabaseConfig, mut factory: F) -> QueryResult<Self>
    where
        F: FnMut(
            &str,
            &crate::config::ConnectionConfig,
            DialectKind,
        ) -> QueryResult<Arc<dyn Connection>>,
    {
        config.validate()?;
        let mut registry = Self::new();
        for (name, conn_config) in &config.connections {
            let conn = factory(name, conn_config, conn_config.dialect()?)?;
            registry.connections.insert(name.clone(), conn);
        }
        registry.default = Some(config.default_name().to_string());
        Ok(registry)
    }
}
