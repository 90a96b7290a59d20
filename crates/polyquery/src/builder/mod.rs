//! The query compiler: turns a [`Query`] and its condition tree into
//! dialect-specific SQL plus an ordered parameter map.
//!
//! A [`QueryBuilder`] holds only shared references (dialect, optional
//! schema) and is `Copy`. All per-build state (placeholder counter and
//! accumulated params) lives in a [`BuildContext`] created by each
//! [`build`](QueryBuilder::build) call, so one builder can be reused freely
//! and building the same query twice gives identical output.
//!
//! # Example
//! ```ignore
//! use polyquery::{Condition, DialectKind, Query, QueryBuilder};
//!
//! let qb = QueryBuilder::new(DialectKind::Mysql.dialect());
//! let built = qb.build(
//!     &Query::new()
//!         .select("id, name")
//!         .from("user")
//!         .where_(Condition::hash([("status", 1)]))
//!         .limit(10),
//! )?;
//! assert_eq!(
//!     built.sql,
//!     "SELECT `id`, `name` FROM `user` WHERE `status`=:status1 LIMIT 10"
//! );
//! ```

mod condition;
mod dml;

use crate::condition::{Condition, InValues, Operand};
use crate::dialect::{Dialect, DialectKind};
use crate::error::QueryResult;
use crate::params::Params;
use crate::query::{Join, OrderItem, Query, SelectItem, Selectable, TableRef, TableSource, Union};
use crate::schema::Schema;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;

// ==================== BuildContext ====================

/// Mutable state of one build call: the placeholder counter and the
/// parameters bound so far.
///
/// Sub-queries are compiled with the same context, so their placeholders
/// never collide with the parent's. Names supplied by the caller (raw
/// conditions, expressions, query params) are reserved up front so a
/// generated placeholder can never take them.
pub struct BuildContext<'a> {
    dialect: &'a dyn Dialect,
    inline: bool,
    counter: usize,
    params: Params,
    reserved: HashSet<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(dialect: &'a dyn Dialect, inline: bool) -> Self {
        Self {
            dialect,
            inline,
            counter: 0,
            params: Params::new(),
            reserved: HashSet::new(),
        }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Whether values are rendered as literals instead of placeholders.
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Bind `value` and return the text to put in its place.
    ///
    /// The placeholder is `:<hint stripped of non-alphanumerics><n>`. Names
    /// already bound or reserved are skipped, so no caller param is ever
    /// overwritten.
    /// Booleans are converted to the dialect's boolean value. In inline mode
    /// the value is rendered as a literal and nothing is bound.
    pub fn bind(&mut self, hint: &str, value: Value) -> String {
        if self.inline {
            return self.dialect.literal(&value);
        }
        let value = match value {
            Value::Bool(b) => self.dialect.bool_value(b),
            other => other,
        };
        let mut base: String = hint.chars().filter(char::is_ascii_alphanumeric).collect();
        if base.is_empty() {
            base.push('p');
        }
        let name = loop {
            self.counter += 1;
            let name = format!(":{base}{}", self.counter);
            if !self.params.contains(&name) && !self.reserved.contains(&name) {
                break name;
            }
        };
        self.params.insert(&name, value);
        name
    }

    /// Merge caller-supplied params (raw conditions, expressions, query params).
    pub fn merge(&mut self, params: &Params) {
        self.params.extend(params);
    }

    /// Reserve the names of `params` without binding them.
    pub fn reserve(&mut self, params: &Params) {
        self.reserved.extend(params.names().map(str::to_string));
    }

    /// Reserve every caller-supplied name reachable from `query`, sub-queries included.
    pub fn reserve_query(&mut self, query: &Query) {
        self.reserve(&query.params);
        for item in &query.select {
            self.reserve_selectable(&item.item);
        }
        for table in query.from.iter().chain(query.join.iter().map(|j| &j.table)) {
            match &table.source {
                TableSource::Table(_) => {}
                TableSource::Query(sub) => self.reserve_query(sub),
                TableSource::Expr(expr) => self.reserve(expr.params()),
            }
        }
        let conditions = query
            .join
            .iter()
            .filter_map(|j| j.on.as_ref())
            .chain(query.where_.as_ref())
            .chain(query.having.as_ref());
        for condition in conditions {
            self.reserve_condition(condition);
        }
        for item in &query.group_by {
            self.reserve_selectable(item);
        }
        for item in &query.order_by {
            if let OrderItem::Expr(expr) = item {
                self.reserve(expr.params());
            }
        }
        for union in &query.union {
            self.reserve_query(&union.query);
        }
    }

    /// Reserve every caller-supplied name reachable from `condition`.
    pub fn reserve_condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Hash(pairs) => {
                for (_, operand) in pairs {
                    self.reserve_operand(operand);
                }
            }
            Condition::And(items) | Condition::Or(items) => {
                for item in items {
                    self.reserve_condition(item);
                }
            }
            Condition::Not(inner) => self.reserve_condition(inner),
            Condition::In {
                values: InValues::Query(query),
                ..
            }
            | Condition::Exists { query, .. } => self.reserve_query(query),
            Condition::Compare { value, .. } | Condition::Lookup { value, .. } => {
                self.reserve_operand(value)
            }
            Condition::Raw { params, .. } => self.reserve(params),
            Condition::Expr(expr) => self.reserve(expr.params()),
            Condition::Between { .. } | Condition::In { .. } | Condition::Like { .. } => {}
        }
    }

    pub fn reserve_operand(&mut self, operand: &Operand) {
        match operand {
            Operand::Query(query) => self.reserve_query(query),
            Operand::Expr(expr) => self.reserve(expr.params()),
            Operand::Value(_) | Operand::List(_) => {}
        }
    }

    fn reserve_selectable(&mut self, item: &Selectable) {
        match item {
            Selectable::Column(_) => {}
            Selectable::Expr(expr) => self.reserve(expr.params()),
            Selectable::Query(query) => self.reserve_query(query),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("dialect", &self.dialect.name())
            .field("inline", &self.inline)
            .field("counter", &self.counter)
            .field("params", &self.params)
            .field("reserved", &self.reserved)
            .finish()
    }
}

// ==================== Built ====================

/// Placeholder style for [`Built::to_positional`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (SQLite, MySQL, CUBRID, ODBC).
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Dollar,
}

/// A compiled statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Built {
    pub sql: String,
    /// `None` when nothing was bound.
    pub params: Option<Params>,
}

impl Built {
    pub fn new(sql: String, params: Params) -> Self {
        Self {
            sql,
            params: (!params.is_empty()).then_some(params),
        }
    }

    /// Rewrite `:name` placeholders as positional ones, in SQL text order.
    ///
    /// Quoted strings and identifiers are left alone, as are `::` casts and
    /// names with no bound value. A placeholder used twice is bound twice.
    pub fn to_positional(&self, style: PlaceholderStyle) -> (String, Vec<Value>) {
        let empty = Params::new();
        let params = self.params.as_ref().unwrap_or(&empty);
        let mut out = String::with_capacity(self.sql.len());
        let mut values = Vec::new();
        let mut chars = self.sql.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(ch) = chars.next() {
            if let Some(q) = quote {
                out.push(ch);
                if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '[' => {
                    quote = Some(']');
                    out.push(ch);
                }
                ':' if chars.peek() == Some(&':') => {
                    out.push_str("::");
                    chars.next();
                }
                ':' if chars.peek().is_some_and(|c| c.is_ascii_alphabetic() || *c == '_') => {
                    let mut name = String::from(":");
                    while let Some(c) = chars.peek().copied() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    match params.get(&name) {
                        Some(value) => {
                            values.push(value.clone());
                            match style {
                                PlaceholderStyle::Question => out.push('?'),
                                PlaceholderStyle::Dollar => {
                                    out.push('$');
                                    out.push_str(&values.len().to_string());
                                }
                            }
                        }
                        None => out.push_str(&name),
                    }
                }
                _ => out.push(ch),
            }
        }
        (out, values)
    }
}

// ==================== QueryBuilder ====================

/// Compiles queries, conditions and DML statements for one dialect.
#[derive(Clone, Copy)]
pub struct QueryBuilder<'a> {
    dialect: &'a dyn Dialect,
    schema: Option<&'a dyn Schema>,
    inline_values: bool,
}

impl fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect.name())
            .field("schema", &self.schema.is_some())
            .field("inline_values", &self.inline_values)
            .finish()
    }
}

impl<'a> QueryBuilder<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            schema: None,
            inline_values: false,
        }
    }

    /// Builder for one of the built-in dialects.
    pub fn for_kind(kind: DialectKind) -> QueryBuilder<'static> {
        QueryBuilder::new(kind.dialect())
    }

    /// Attach schema metadata, used to cast INSERT/UPDATE values.
    pub fn with_schema(mut self, schema: &'a dyn Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Render values as SQL literals instead of placeholders.
    pub fn inline_values(mut self, inline: bool) -> Self {
        self.inline_values = inline;
        self
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// A fresh context for building fragments by hand.
    pub fn context(&self) -> BuildContext<'a> {
        BuildContext::new(self.dialect, self.inline_values)
    }

    fn finish(&self, sql: String, ctx: BuildContext<'a>) -> Built {
        let built = Built::new(sql, ctx.into_params());
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "polyquery.build",
            dialect = self.dialect.name(),
            param_count = built.params.as_ref().map_or(0, Params::len),
            sql = %built.sql,
            "built statement"
        );
        built
    }

    /// Compile a SELECT.
    pub fn build(&self, query: &Query) -> QueryResult<Built> {
        let mut ctx = self.context();
        ctx.reserve_query(query);
        let sql = self.build_query(&mut ctx, query)?;
        Ok(self.finish(sql, ctx))
    }

    pub(crate) fn build_query(
        &self,
        ctx: &mut BuildContext<'a>,
        query: &Query,
    ) -> QueryResult<String> {
        ctx.merge(&query.params);

        let clauses = [
            self.build_select(ctx, query)?,
            self.build_from(ctx, &query.from)?,
            self.build_join(ctx, &query.join)?,
            self.build_where(ctx, query)?,
            self.build_group_by(ctx, &query.group_by)?,
            self.build_having(ctx, query)?,
            self.build_order_by(ctx, &query.order_by),
            self.build_limit(query.limit, query.offset),
        ];
        let mut sql = clauses
            .iter()
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        let union = self.build_union(ctx, &query.union)?;
        if !union.is_empty() {
            sql = if self.dialect.parenthesize_union() {
                format!("({sql}) {union}")
            } else {
                format!("{sql} {union}")
            };
        }
        Ok(sql.trim().to_string())
    }

    pub(crate) fn sub_query(
        &self,
        ctx: &mut BuildContext<'a>,
        query: &Query,
    ) -> QueryResult<String> {
        Ok(format!("({})", self.build_query(ctx, query)?))
    }

    // ==================== Clauses ====================

    fn build_select(&self, ctx: &mut BuildContext<'a>, query: &Query) -> QueryResult<String> {
        let mut sql = String::from("SELECT");
        let distinct = self.dialect.build_distinct(&query.distinct)?;
        if !distinct.is_empty() {
            sql.push(' ');
            sql.push_str(&distinct);
        }
        if let Some(option) = query.select_option.as_deref().filter(|o| !o.is_empty()) {
            sql.push(' ');
            sql.push_str(option);
        }
        if query.select.is_empty() {
            sql.push_str(" *");
            return Ok(sql);
        }
        let columns = query
            .select
            .iter()
            .map(|item| self.build_select_item(ctx, item))
            .collect::<QueryResult<Vec<_>>>()?;
        sql.push(' ');
        sql.push_str(&columns.join(", "));
        Ok(sql)
    }

    fn build_select_item(
        &self,
        ctx: &mut BuildContext<'a>,
        item: &SelectItem,
    ) -> QueryResult<String> {
        let expr = self.build_selectable(ctx, &item.item)?;
        Ok(match &item.alias {
            Some(alias) => format!("{expr} AS {}", self.dialect.quote_column_name(alias)),
            None => expr,
        })
    }

    fn build_selectable(
        &self,
        ctx: &mut BuildContext<'a>,
        item: &Selectable,
    ) -> QueryResult<String> {
        Ok(match item {
            Selectable::Column(column) => self.dialect.quote_column_name(column),
            Selectable::Expr(expr) => {
                ctx.merge(expr.params());
                expr.sql().to_string()
            }
            Selectable::Query(query) => self.sub_query(ctx, query)?,
        })
    }

    fn build_table_ref(&self, ctx: &mut BuildContext<'a>, table: &TableRef) -> QueryResult<String> {
        let source = match &table.source {
            TableSource::Table(name) => self.dialect.quote_table_name(name),
            TableSource::Query(query) => self.sub_query(ctx, query)?,
            TableSource::Expr(expr) => {
                ctx.merge(expr.params());
                expr.sql().to_string()
            }
        };
        Ok(match &table.alias {
            Some(alias) => format!("{source} {}", self.dialect.quote_table_name(alias)),
            None => source,
        })
    }

    fn build_from(&self, ctx: &mut BuildContext<'a>, from: &[TableRef]) -> QueryResult<String> {
        if from.is_empty() {
            return Ok(String::new());
        }
        let tables = from
            .iter()
            .map(|t| self.build_table_ref(ctx, t))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(format!("FROM {}", tables.join(", ")))
    }

    fn build_join(&self, ctx: &mut BuildContext<'a>, joins: &[Join]) -> QueryResult<String> {
        let mut parts = Vec::with_capacity(joins.len());
        for join in joins {
            self.dialect.check_join(&join.kind)?;
            let table = self.build_table_ref(ctx, &join.table)?;
            let mut sql = format!("{} {table}", join.kind.as_sql());
            if let Some(on) = &join.on {
                let cond = self.build_condition(ctx, on)?;
                if !cond.is_empty() {
                    sql.push_str(" ON ");
                    sql.push_str(&cond);
                }
            }
            parts.push(sql);
        }
        Ok(parts.join(" "))
    }

    fn build_where(&self, ctx: &mut BuildContext<'a>, query: &Query) -> QueryResult<String> {
        self.prefixed_condition(ctx, "WHERE", query.where_.as_ref())
    }

    fn build_having(&self, ctx: &mut BuildContext<'a>, query: &Query) -> QueryResult<String> {
        self.prefixed_condition(ctx, "HAVING", query.having.as_ref())
    }

    pub(crate) fn prefixed_condition(
        &self,
        ctx: &mut BuildContext<'a>,
        keyword: &str,
        condition: Option<&Condition>,
    ) -> QueryResult<String> {
        let Some(condition) = condition else {
            return Ok(String::new());
        };
        let sql = self.build_condition(ctx, condition)?;
        Ok(if sql.is_empty() {
            sql
        } else {
            format!("{keyword} {sql}")
        })
    }

    fn build_group_by(
        &self,
        ctx: &mut BuildContext<'a>,
        group_by: &[Selectable],
    ) -> QueryResult<String> {
        if group_by.is_empty() {
            return Ok(String::new());
        }
        let cols = group_by
            .iter()
            .map(|g| self.build_selectable(ctx, g))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(format!("GROUP BY {}", cols.join(", ")))
    }

    /// Render an ORDER BY clause. Directions are always explicit.
    pub fn build_order_by(&self, ctx: &mut BuildContext<'a>, items: &[OrderItem]) -> String {
        if items.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = items
            .iter()
            .map(|item| match item {
                OrderItem::Column { column, order } => {
                    format!("{} {}", self.dialect.quote_column_name(column), order.as_sql())
                }
                OrderItem::Expr(expr) => {
                    ctx.merge(expr.params());
                    expr.sql().to_string()
                }
                OrderItem::Random => self.dialect.random_function().to_string(),
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Render the LIMIT/OFFSET clause for this dialect.
    pub fn build_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        self.dialect.build_limit(limit, offset)
    }

    fn build_union(&self, ctx: &mut BuildContext<'a>, unions: &[Union]) -> QueryResult<String> {
        let mut parts = Vec::with_capacity(unions.len());
        for union in unions {
            let keyword = if union.all { "UNION ALL" } else { "UNION" };
            let sql = self.build_query(ctx, &union.query)?;
            parts.push(if self.dialect.parenthesize_union() {
                format!("{keyword} ({sql})")
            } else {
                format!("{keyword} {sql}")
            });
        }
        Ok(parts.join(" "))
    }
}

#[cfg(test)]
mod tests;
