//! The fluent statement descriptor consumed by [`QueryBuilder`](crate::builder::QueryBuilder).
//!
//! A [`Query`] only describes a SELECT; it holds no SQL text until it is
//! built, and can be built any number of times against any dialect.
//!
//! # Example
//! ```ignore
//! use polyquery::{Condition, Query};
//!
//! let q = Query::new()
//!     .select("id, name AS title")
//!     .from("post p")
//!     .left_join("user u", "u.id = p.author_id")
//!     .where_(Condition::hash([("p.status", 1)]))
//!     .order_by_str("p.created_at DESC")
//!     .limit(20);
//! ```

use crate::condition::Condition;
use crate::connection::{Command, Connection, Row};
use crate::error::QueryResult;
use crate::expression::Expression;
use crate::params::Params;
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

// ==================== Parts ====================

/// What a SELECT item refers to.
#[derive(Clone, Debug)]
pub enum Selectable {
    /// Column name or expression text, quoted by the builder where possible.
    Column(String),
    Expr(Expression),
    Query(Box<Query>),
}

/// One entry of the SELECT list.
#[derive(Clone, Debug)]
pub struct SelectItem {
    pub item: Selectable,
    pub alias: Option<String>,
}

/// DISTINCT mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Distinct {
    #[default]
    No,
    All,
    /// `DISTINCT ON (cols)`; PostgreSQL only.
    On(Vec<String>),
}

/// What a FROM entry refers to.
#[derive(Clone, Debug)]
pub enum TableSource {
    Table(String),
    Query(Box<Query>),
    Expr(Expression),
}

/// One FROM (or JOIN) table reference.
#[derive(Clone, Debug)]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

impl TableRef {
    /// Parse `"table"`, `"table alias"` or `"table AS alias"`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if !text.contains('(') {
            if let Some(caps) = table_alias_re().captures(text) {
                return TableRef {
                    source: TableSource::Table(caps[1].to_string()),
                    alias: Some(caps[2].to_string()),
                };
            }
        }
        TableRef {
            source: TableSource::Table(text.to_string()),
            alias: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    /// Any other join keyword, rendered verbatim (e.g. `NATURAL JOIN`).
    Custom(String),
}

impl JoinKind {
    pub fn as_sql(&self) -> &str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Custom(kw) => kw,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Option<Condition>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug)]
pub enum OrderItem {
    Column { column: String, order: Order },
    Expr(Expression),
    /// The dialect's random function.
    Random,
}

#[derive(Clone, Debug)]
pub struct Union {
    pub query: Box<Query>,
    pub all: bool,
}

/// Derives the key of each row in [`Query::all_indexed`].
#[derive(Clone)]
pub enum IndexBy {
    Column(String),
    Fn(Arc<dyn Fn(&Row) -> String + Send + Sync>),
}

impl fmt::Debug for IndexBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexBy::Column(c) => f.debug_tuple("Column").field(c).finish(),
            IndexBy::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

fn column_alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*?)(?i:\s+as\s+|\s+)([\w\-]+)$").expect("invalid built-in alias regex")
    })
}

fn table_alias_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*?)(?i:\s+as|)\s+([^ ]+)$").expect("invalid built-in table alias regex")
    })
}

fn order_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.*?)\s+(?i)(asc|desc)$").expect("invalid built-in order regex")
    })
}

/// Split a comma separated list, ignoring commas inside parentheses.
pub(crate) fn split_list(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

fn parse_select_item(text: &str) -> SelectItem {
    if let Some(caps) = column_alias_re().captures(text) {
        let alias = &caps[2];
        if !alias.chars().all(|c| c.is_ascii_digit()) && !caps[1].trim().is_empty() {
            return SelectItem {
                item: Selectable::Column(caps[1].trim().to_string()),
                alias: Some(alias.to_string()),
            };
        }
    }
    SelectItem {
        item: Selectable::Column(text.to_string()),
        alias: None,
    }
}

// ==================== Query ====================

/// A SELECT statement description.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub(crate) select: Vec<SelectItem>,
    pub(crate) select_option: Option<String>,
    pub(crate) distinct: Distinct,
    pub(crate) from: Vec<TableRef>,
    pub(crate) join: Vec<Join>,
    pub(crate) where_: Option<Condition>,
    pub(crate) group_by: Vec<Selectable>,
    pub(crate) having: Option<Condition>,
    pub(crate) order_by: Vec<OrderItem>,
    pub(crate) union: Vec<Union>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) index_by: Option<IndexBy>,
    pub(crate) params: Params,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== SELECT ====================

    /// Set the SELECT list from comma separated text (`"id, name AS title"`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = split_list(columns).iter().map(|c| parse_select_item(c)).collect();
        self
    }

    /// Set the SELECT list from individual columns.
    pub fn select_cols(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| parse_select_item(c.trim())).collect();
        self
    }

    /// Append columns to the SELECT list.
    pub fn add_select(mut self, columns: &str) -> Self {
        self.select
            .extend(split_list(columns).iter().map(|c| parse_select_item(c)));
        self
    }

    pub fn select_expr(mut self, expr: Expression, alias: Option<&str>) -> Self {
        self.select.push(SelectItem {
            item: Selectable::Expr(expr),
            alias: alias.map(str::to_string),
        });
        self
    }

    /// Append a scalar sub-query to the SELECT list.
    pub fn select_query(mut self, query: Query, alias: &str) -> Self {
        self.select.push(SelectItem {
            item: Selectable::Query(Box::new(query)),
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Modifier placed right after `SELECT` (e.g. `SQL_CALC_FOUND_ROWS`).
    pub fn select_option(mut self, option: &str) -> Self {
        self.select_option = Some(option.to_string());
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = if distinct { Distinct::All } else { Distinct::No };
        self
    }

    /// `DISTINCT ON (cols)`.
    pub fn distinct_on(mut self, columns: &[&str]) -> Self {
        self.distinct = Distinct::On(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// `DISTINCT ON` from a keyed mapping; only the mapped columns are used.
    pub fn distinct_on_map<K, V, I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        V: Into<String>,
    {
        self.distinct = Distinct::On(columns.into_iter().map(|(_, v)| v.into()).collect());
        self
    }

    // ==================== FROM ====================

    /// Set FROM from comma separated text (`"user u, profile"`).
    pub fn from(mut self, tables: &str) -> Self {
        self.from = split_list(tables).iter().map(|t| TableRef::parse(t)).collect();
        self
    }

    pub fn from_tables(mut self, tables: &[&str]) -> Self {
        self.from = tables.iter().map(|t| TableRef::parse(t)).collect();
        self
    }

    /// Select from a sub-query.
    pub fn from_query(mut self, query: Query, alias: &str) -> Self {
        self.from.push(TableRef {
            source: TableSource::Query(Box::new(query)),
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn from_expr(mut self, expr: Expression, alias: Option<&str>) -> Self {
        self.from.push(TableRef {
            source: TableSource::Expr(expr),
            alias: alias.map(str::to_string),
        });
        self
    }

    // ==================== JOIN ====================

    pub fn join(mut self, kind: JoinKind, table: &str, on: impl Into<Condition>) -> Self {
        self.join.push(Join {
            kind,
            table: TableRef::parse(table),
            on: Some(on.into()),
        });
        self
    }

    pub fn inner_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn left_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    pub fn right_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    pub fn full_join(self, table: &str, on: impl Into<Condition>) -> Self {
        self.join(JoinKind::Full, table, on)
    }

    pub fn cross_join(mut self, table: &str) -> Self {
        self.join.push(Join {
            kind: JoinKind::Cross,
            table: TableRef::parse(table),
            on: None,
        });
        self
    }

    /// Join a sub-query under `alias`.
    pub fn join_query(
        mut self,
        kind: JoinKind,
        query: Query,
        alias: &str,
        on: impl Into<Condition>,
    ) -> Self {
        self.join.push(Join {
            kind,
            table: TableRef {
                source: TableSource::Query(Box::new(query)),
                alias: Some(alias.to_string()),
            },
            on: Some(on.into()),
        });
        self
    }

    // ==================== WHERE / HAVING ====================

    /// Replace the WHERE condition.
    pub fn where_(mut self, condition: impl Into<Condition>) -> Self {
        self.where_ = Some(condition.into());
        self
    }

    pub fn and_where(mut self, condition: impl Into<Condition>) -> Self {
        self.where_ = Some(match self.where_.take() {
            Some(existing) => existing.and_with(condition.into()),
            None => condition.into(),
        });
        self
    }

    pub fn or_where(mut self, condition: impl Into<Condition>) -> Self {
        self.where_ = Some(match self.where_.take() {
            Some(existing) => existing.or_with(condition.into()),
            None => condition.into(),
        });
        self
    }

    pub fn having(mut self, condition: impl Into<Condition>) -> Self {
        self.having = Some(condition.into());
        self
    }

    pub fn and_having(mut self, condition: impl Into<Condition>) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and_with(condition.into()),
            None => condition.into(),
        });
        self
    }

    pub fn or_having(mut self, condition: impl Into<Condition>) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.or_with(condition.into()),
            None => condition.into(),
        });
        self
    }

    // ==================== GROUP BY / ORDER BY ====================

    /// Set GROUP BY from comma separated text.
    pub fn group_by(mut self, columns: &str) -> Self {
        self.group_by = split_list(columns).into_iter().map(Selectable::Column).collect();
        self
    }

    pub fn add_group_by(mut self, columns: &str) -> Self {
        self.group_by
            .extend(split_list(columns).into_iter().map(Selectable::Column));
        self
    }

    pub fn group_by_expr(mut self, expr: Expression) -> Self {
        self.group_by.push(Selectable::Expr(expr));
        self
    }

    /// Order by one column. Ordering the same column again replaces its direction.
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        let column = column.trim().to_string();
        let existing = self.order_by.iter_mut().find_map(|item| match item {
            OrderItem::Column { column: c, order } if *c == column => Some(order),
            _ => None,
        });
        match existing {
            Some(o) => *o = order,
            None => self.order_by.push(OrderItem::Column { column, order }),
        }
        self
    }

    /// Replace ORDER BY from text such as `"created_at DESC, id"`.
    pub fn order_by_str(mut self, text: &str) -> Self {
        self.order_by.clear();
        self.add_order_by_str(text)
    }

    /// Append ORDER BY entries from text.
    pub fn add_order_by_str(mut self, text: &str) -> Self {
        for part in split_list(text) {
            self = match order_re().captures(&part) {
                Some(caps) => {
                    let order = if caps[2].eq_ignore_ascii_case("desc") {
                        Order::Desc
                    } else {
                        Order::Asc
                    };
                    let column = caps[1].to_string();
                    self.order_by(&column, order)
                }
                None => self.order_by(&part, Order::Asc),
            };
        }
        self
    }

    pub fn order_by_expr(mut self, expr: Expression) -> Self {
        self.order_by.push(OrderItem::Expr(expr));
        self
    }

    /// Order by the dialect's random function.
    pub fn order_by_random(mut self) -> Self {
        self.order_by.push(OrderItem::Random);
        self
    }

    // ==================== UNION / LIMIT ====================

    pub fn union(mut self, query: Query) -> Self {
        self.union.push(Union {
            query: Box::new(query),
            all: false,
        });
        self
    }

    pub fn union_all(mut self, query: Query) -> Self {
        self.union.push(Union {
            query: Box::new(query),
            all: true,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Remove LIMIT and OFFSET.
    pub fn clear_limit(mut self) -> Self {
        self.limit = None;
        self.offset = None;
        self
    }

    // ==================== Params / indexing ====================

    /// Replace the caller-supplied params.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn add_params(mut self, params: &Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Bind one caller-supplied placeholder.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Key rows of [`all_indexed`](Query::all_indexed) by a column.
    pub fn index_by(mut self, column: &str) -> Self {
        self.index_by = Some(IndexBy::Column(column.to_string()));
        self
    }

    /// Key rows of [`all_indexed`](Query::all_indexed) with a function.
    pub fn index_by_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Row) -> String + Send + Sync + 'static,
    {
        self.index_by = Some(IndexBy::Fn(Arc::new(f)));
        self
    }

    // ==================== Accessors ====================

    pub fn where_condition(&self) -> Option<&Condition> {
        self.where_.as_ref()
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn get_params(&self) -> &Params {
        &self.params
    }

    /// A copy of this query selecting only `expr`, for aggregates.
    ///
    /// Ordering and limits are dropped. Queries with DISTINCT, GROUP BY,
    /// HAVING or UNION are wrapped as a sub-query instead so the aggregate
    /// sees the same rows.
    pub fn scalar_query(&self, expr: &str) -> Query {
        let needs_wrap = self.distinct != Distinct::No
            || !self.group_by.is_empty()
            || self.having.is_some()
            || !self.union.is_empty();
        if needs_wrap {
            return Query::new()
                .select_expr(Expression::new(expr), None)
                .from_query(self.clone(), "c");
        }
        let mut q = self.clone();
        q.select = vec![SelectItem {
            item: Selectable::Expr(Expression::new(expr)),
            alias: None,
        }];
        q.order_by.clear();
        q.limit = None;
        q.offset = None;
        q.index_by = None;
        q
    }

    // ==================== Execution ====================

    fn command<'c>(&self, conn: &'c dyn Connection) -> QueryResult<Command<'c>> {
        let built = conn.query_builder().build(self)?;
        Ok(Command::from_built(conn, built))
    }

    /// Fetch all rows.
    pub fn all(&self, conn: &dyn Connection) -> QueryResult<Vec<Row>> {
        self.command(conn)?.query_all()
    }

    /// Fetch all rows keyed by [`index_by`](Query::index_by).
    ///
    /// Without an index, rows are keyed by position. A missing index column
    /// keys the row by an empty string.
    pub fn all_indexed(&self, conn: &dyn Connection) -> QueryResult<IndexMap<String, Row>> {
        let rows = self.all(conn)?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let key = match &self.index_by {
                    None => i.to_string(),
                    Some(IndexBy::Column(c)) => {
                        row.get(c).map(Value::to_string).unwrap_or_default()
                    }
                    Some(IndexBy::Fn(f)) => f(&row),
                };
                (key, row)
            })
            .collect())
    }

    /// Fetch the first row.
    pub fn one(&self, conn: &dyn Connection) -> QueryResult<Option<Row>> {
        self.command(conn)?.query_one()
    }

    /// Fetch the first column of the first row.
    pub fn scalar(&self, conn: &dyn Connection) -> QueryResult<Option<Value>> {
        self.command(conn)?.query_scalar()
    }

    /// Fetch the first column of every row.
    pub fn column(&self, conn: &dyn Connection) -> QueryResult<Vec<Value>> {
        self.command(conn)?.query_column()
    }

    /// `COUNT(expr)` over the rows this query matches.
    pub fn count(&self, conn: &dyn Connection, expr: &str) -> QueryResult<i64> {
        let value = self
            .scalar_query(&format!("COUNT({expr})"))
            .scalar(conn)?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Whether this query matches at least one row.
    pub fn exists(&self, conn: &dyn Connection) -> QueryResult<bool> {
        let built = conn.query_builder().build(self)?;
        let sql = conn.dialect().select_exists(&built.sql);
        let params = built.params.unwrap_or_default();
        let value = Command::new(conn, sql).with_params(params).query_scalar()?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }
}
