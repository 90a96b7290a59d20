//! Condition compiler.

use super::{BuildContext, Built, QueryBuilder};
use crate::condition::{CompareOp, Condition, InValues, LikeOp, Operand};
use crate::error::{QueryError, QueryResult};
use crate::lookup::{Lookup, escape_like};
use crate::value::Value;

impl<'a> QueryBuilder<'a> {
    /// Compile a condition on its own, with a fresh context.
    pub fn condition(&self, condition: &Condition) -> QueryResult<Built> {
        let mut ctx = self.context();
        ctx.reserve_condition(condition);
        let sql = self.build_condition(&mut ctx, condition)?;
        Ok(Built::new(sql, ctx.into_params()))
    }

    /// Compile a condition into `ctx`. Empty conditions render as `""`.
    pub fn build_condition(
        &self,
        ctx: &mut BuildContext<'a>,
        condition: &Condition,
    ) -> QueryResult<String> {
        match condition {
            Condition::Hash(pairs) => {
                let mut parts = Vec::with_capacity(pairs.len());
                for (column, operand) in pairs {
                    let sql = self.build_hash_pair(ctx, column, operand)?;
                    if !sql.is_empty() {
                        parts.push(sql);
                    }
                }
                Ok(parts.join(" AND "))
            }
            Condition::And(items) => self.build_group(ctx, items, "AND"),
            Condition::Or(items) => self.build_group(ctx, items, "OR"),
            Condition::Not(inner) => {
                let sql = self.build_condition(ctx, inner)?;
                Ok(if sql.is_empty() {
                    sql
                } else {
                    format!("NOT ({sql})")
                })
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => {
                let quoted = self.dialect.quote_column_name(column);
                let low = ctx.bind(column, low.clone());
                let high = ctx.bind(column, high.clone());
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{quoted} {op} {low} AND {high}"))
            }
            Condition::In {
                columns,
                values,
                negated,
            } => self.build_in(ctx, columns, values, *negated),
            Condition::Like {
                op,
                column,
                values,
                raw_pattern,
            } => self.build_like(ctx, *op, column, values, *raw_pattern),
            Condition::Exists { query, negated } => {
                let sub = self.sub_query(ctx, query)?;
                let op = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!("{op} {sub}"))
            }
            Condition::Compare { column, op, value } => self.build_compare(ctx, column, *op, value),
            Condition::Raw { sql, params } => {
                ctx.merge(params);
                Ok(sql.trim().to_string())
            }
            Condition::Expr(expr) => {
                ctx.merge(expr.params());
                Ok(expr.sql().trim().to_string())
            }
            Condition::Lookup {
                field,
                lookup,
                value,
            } => self.build_lookup(ctx, field, *lookup, value),
        }
    }

    fn build_hash_pair(
        &self,
        ctx: &mut BuildContext<'a>,
        column: &str,
        operand: &Operand,
    ) -> QueryResult<String> {
        let quoted = self.dialect.quote_column_name(column);
        Ok(match operand {
            Operand::Value(Value::Null) => format!("{quoted} IS NULL"),
            Operand::Value(value) => {
                let ph = ctx.bind(column, value.clone());
                format!("{quoted}={ph}")
            }
            Operand::List(values) => {
                return self.build_in_list(ctx, column, values, false);
            }
            Operand::Query(query) => {
                let sub = self.sub_query(ctx, query)?;
                format!("{quoted} IN {sub}")
            }
            Operand::Expr(expr) => {
                ctx.merge(expr.params());
                format!("{quoted}={}", expr.sql())
            }
        })
    }

    fn build_group(
        &self,
        ctx: &mut BuildContext<'a>,
        items: &[Condition],
        operator: &str,
    ) -> QueryResult<String> {
        let mut parts: Vec<(String, &Condition)> = Vec::with_capacity(items.len());
        for item in items {
            let sql = self.build_condition(ctx, item)?;
            if !sql.is_empty() {
                parts.push((sql, item));
            }
        }
        if parts.len() == 1 {
            return Ok(parts.remove(0).0);
        }
        let is_and = operator == "AND";
        let rendered: Vec<String> = parts
            .into_iter()
            .map(|(sql, item)| {
                let wrap = match item {
                    Condition::Or(_) => is_and,
                    Condition::And(_) => !is_and,
                    Condition::Hash(pairs) => !is_and && pairs.len() > 1,
                    Condition::Raw { .. } | Condition::Expr(_) => true,
                    _ => false,
                };
                if wrap { format!("({sql})") } else { sql }
            })
            .collect();
        Ok(rendered.join(&format!(" {operator} ")))
    }

    fn build_in(
        &self,
        ctx: &mut BuildContext<'a>,
        columns: &[String],
        values: &InValues,
        negated: bool,
    ) -> QueryResult<String> {
        if columns.is_empty() {
            return Err(QueryError::malformed("IN requires at least one column"));
        }
        match values {
            InValues::Query(query) => {
                let cols = self.column_tuple(columns);
                let sub = self.sub_query(ctx, query)?;
                let op = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{cols} {op} {sub}"))
            }
            InValues::List(list) => {
                if columns.len() != 1 {
                    return Err(QueryError::malformed(
                        "a multi-column IN needs rows of values, not a flat list",
                    ));
                }
                self.build_in_list(ctx, &columns[0], list, negated)
            }
            InValues::Rows(rows) => self.build_in_rows(ctx, columns, rows, negated),
        }
    }

    fn column_tuple(&self, columns: &[String]) -> String {
        if columns.len() == 1 {
            return self.dialect.quote_column_name(&columns[0]);
        }
        let cols: Vec<String> = columns
            .iter()
            .map(|c| self.dialect.quote_column_name(c))
            .collect();
        format!("({})", cols.join(", "))
    }

    /// Single-column IN. NULL members become an `IS NULL` alternative.
    fn build_in_list(
        &self,
        ctx: &mut BuildContext<'a>,
        column: &str,
        values: &[Value],
        negated: bool,
    ) -> QueryResult<String> {
        if values.is_empty() {
            return Ok(if negated { String::new() } else { "1=0".to_string() });
        }
        let quoted = self.dialect.quote_column_name(column);
        let has_null = values.iter().any(Value::is_null);
        let placeholders: Vec<String> = values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| ctx.bind(column, v.clone()))
            .collect();

        let null_check = if negated {
            format!("{quoted} IS NOT NULL")
        } else {
            format!("{quoted} IS NULL")
        };
        let membership = match placeholders.len() {
            0 => return Ok(null_check),
            1 => {
                let op = if negated { "<>" } else { "=" };
                format!("{quoted}{op}{}", placeholders[0])
            }
            _ => {
                let op = if negated { "NOT IN" } else { "IN" };
                format!("{quoted} {op} ({})", placeholders.join(", "))
            }
        };
        if !has_null {
            return Ok(membership);
        }
        let joiner = if negated { "AND" } else { "OR" };
        Ok(format!("({membership} {joiner} {null_check})"))
    }

    fn build_in_rows(
        &self,
        ctx: &mut BuildContext<'a>,
        columns: &[String],
        rows: &[Vec<Value>],
        negated: bool,
    ) -> QueryResult<String> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(QueryError::malformed(format!(
                "IN row has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }
        if rows.is_empty() {
            return Ok(if negated { String::new() } else { "1=0".to_string() });
        }

        if self.dialect.supports_row_value_in() {
            let tuples: Vec<String> = rows
                .iter()
                .map(|row| {
                    let phs: Vec<String> = columns
                        .iter()
                        .zip(row)
                        .map(|(c, v)| ctx.bind(c, v.clone()))
                        .collect();
                    format!("({})", phs.join(", "))
                })
                .collect();
            let op = if negated { "NOT IN" } else { "IN" };
            return Ok(format!(
                "{} {op} ({})",
                self.column_tuple(columns),
                tuples.join(", ")
            ));
        }

        let alternatives: Vec<String> = rows
            .iter()
            .map(|row| {
                let parts: Vec<String> = columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| {
                        let quoted = self.dialect.quote_column_name(c);
                        if v.is_null() {
                            format!("{quoted} IS NULL")
                        } else {
                            format!("{quoted}={}", ctx.bind(c, v.clone()))
                        }
                    })
                    .collect();
                parts.join(" AND ")
            })
            .collect();
        // A single row is a plain AND chain. Several rows form an OR that is
        // parenthesized as a whole so it binds as one operand in any group.
        let sql = if alternatives.len() == 1 {
            let row = &alternatives[0];
            if negated {
                format!("NOT ({row})")
            } else {
                row.clone()
            }
        } else {
            let any = alternatives
                .iter()
                .map(|a| format!("({a})"))
                .collect::<Vec<_>>()
                .join(" OR ");
            if negated {
                format!("NOT ({any})")
            } else {
                format!("({any})")
            }
        };
        Ok(sql)
    }

    fn build_like(
        &self,
        ctx: &mut BuildContext<'a>,
        op: LikeOp,
        column: &str,
        values: &[Value],
        raw_pattern: bool,
    ) -> QueryResult<String> {
        if values.is_empty() {
            return Ok(if op.is_negated() { String::new() } else { "1=0".to_string() });
        }
        let quoted = self.dialect.quote_column_name(column);
        let keyword = if op.is_case_insensitive() {
            self.dialect.ilike_operator()
        } else {
            "LIKE"
        };
        let keyword = if op.is_negated() {
            format!("NOT {keyword}")
        } else {
            keyword.to_string()
        };

        let mut parts = Vec::with_capacity(values.len());
        for value in values {
            if value.is_null() {
                return Err(QueryError::malformed(format!(
                    "LIKE on {column} received NULL"
                )));
            }
            let (pattern, escape) = if raw_pattern {
                (value.to_string(), "")
            } else {
                (
                    format!("%{}%", escape_like(&value.to_string())),
                    self.dialect.like_escape(),
                )
            };
            let ph = ctx.bind(column, Value::Text(pattern));
            parts.push(format!("{quoted} {keyword} {ph}{escape}"));
        }
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        Ok(format!("({})", parts.join(op.joiner())))
    }

    fn build_compare(
        &self,
        ctx: &mut BuildContext<'a>,
        column: &str,
        op: CompareOp,
        value: &Operand,
    ) -> QueryResult<String> {
        let quoted = self.dialect.quote_column_name(column);
        let rhs = match value {
            Operand::Value(Value::Null) => "NULL".to_string(),
            Operand::Value(v) => ctx.bind(column, v.clone()),
            Operand::Query(query) => self.sub_query(ctx, query)?,
            Operand::Expr(expr) => {
                ctx.merge(expr.params());
                expr.sql().to_string()
            }
            Operand::List(_) => {
                return Err(QueryError::malformed(format!(
                    "operator '{}' expects a single value for {column}",
                    op.as_str()
                )));
            }
        };
        Ok(format!("{quoted} {} {rhs}", op.as_str()))
    }

    fn build_lookup(
        &self,
        ctx: &mut BuildContext<'a>,
        field: &str,
        lookup: Lookup,
        value: &Operand,
    ) -> QueryResult<String> {
        let quoted = self.dialect.quote_column_name(field);
        match (lookup, value) {
            (Lookup::In, Operand::Query(query)) => {
                let sub = self.sub_query(ctx, query)?;
                Ok(format!("{quoted} IN {sub}"))
            }
            _ => self.dialect.lookups().build(ctx, lookup, &quoted, value),
        }
    }
}
