//! INSERT / UPDATE / DELETE and a few table-level statements.

use super::{BuildContext, Built, QueryBuilder};
use crate::condition::{Condition, Operand};
use crate::error::{QueryError, QueryResult};
use crate::query::Query;
use crate::value::Value;

impl<'a> QueryBuilder<'a> {
    /// Cast `value` with the column's schema, when a schema is attached and knows the column.
    fn typecast(&self, table: &str, column: &str, value: &Value) -> Value {
        self.schema
            .and_then(|s| s.table_schema(table))
            .and_then(|t| t.column(column))
            .map_or_else(|| value.clone(), |c| c.typecast(value))
    }

    /// Render one SET/VALUES operand.
    fn dml_value(
        &self,
        ctx: &mut BuildContext<'a>,
        table: &str,
        column: &str,
        operand: &Operand,
    ) -> QueryResult<String> {
        match operand {
            Operand::Value(value) => {
                let value = self.typecast(table, column, value);
                Ok(ctx.bind(column, value))
            }
            Operand::Expr(expr) => {
                ctx.merge(expr.params());
                Ok(expr.sql().to_string())
            }
            Operand::Query(query) => self.sub_query(ctx, query),
            Operand::List(_) => Err(QueryError::validation(format!(
                "column {column} cannot take a list of values"
            ))),
        }
    }

    /// `INSERT INTO table (cols) VALUES (...)`.
    ///
    /// With no columns, the dialect's default-values form is used.
    pub fn insert(&self, table: &str, columns: &[(&str, Operand)]) -> QueryResult<Built> {
        let mut ctx = self.context();
        let quoted_table = self.dialect.quote_table_name(table);
        if columns.is_empty() {
            let sql = self.dialect.default_values_insert(&quoted_table);
            return Ok(self.finish(sql, ctx));
        }
        for (_, operand) in columns {
            ctx.reserve_operand(operand);
        }
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (column, operand) in columns {
            names.push(self.dialect.quote_column_name(column));
            values.push(self.dml_value(&mut ctx, table, column, operand)?);
        }
        let sql = format!(
            "INSERT INTO {quoted_table} ({}) VALUES ({})",
            names.join(", "),
            values.join(", ")
        );
        Ok(self.finish(sql, ctx))
    }

    /// `INSERT INTO table (cols) SELECT ...`.
    pub fn insert_from(&self, table: &str, columns: &[&str], query: &Query) -> QueryResult<Built> {
        let mut ctx = self.context();
        ctx.reserve_query(query);
        let select = self.build_query(&mut ctx, query)?;
        let quoted_table = self.dialect.quote_table_name(table);
        let sql = if columns.is_empty() {
            format!("INSERT INTO {quoted_table} {select}")
        } else {
            let names: Vec<String> = columns
                .iter()
                .map(|c| self.dialect.quote_column_name(c))
                .collect();
            format!("INSERT INTO {quoted_table} ({}) {select}", names.join(", "))
        };
        Ok(self.finish(sql, ctx))
    }

    /// Multi-row INSERT. Every row must have one value per column.
    pub fn batch_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<Value>],
    ) -> QueryResult<Built> {
        if columns.is_empty() {
            return Err(QueryError::validation("batch insert needs at least one column"));
        }
        if rows.is_empty() {
            return Err(QueryError::validation("batch insert needs at least one row"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(QueryError::BatchInsertMismatch {
                    row: i,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }

        let mut ctx = self.context();
        let names: Vec<String> = columns
            .iter()
            .map(|c| self.dialect.quote_column_name(c))
            .collect();
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<String> = columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| {
                        let value = self.typecast(table, column, value);
                        ctx.bind(column, value)
                    })
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.dialect.quote_table_name(table),
            names.join(", "),
            tuples.join(", ")
        );
        Ok(self.finish(sql, ctx))
    }

    /// `UPDATE table SET col=value, ... [WHERE condition]`.
    pub fn update(
        &self,
        table: &str,
        columns: &[(&str, Operand)],
        condition: Option<&Condition>,
    ) -> QueryResult<Built> {
        if columns.is_empty() {
            return Err(QueryError::validation("update needs at least one column"));
        }
        let mut ctx = self.context();
        for (_, operand) in columns {
            ctx.reserve_operand(operand);
        }
        if let Some(condition) = condition {
            ctx.reserve_condition(condition);
        }
        let mut sets = Vec::with_capacity(columns.len());
        for (column, operand) in columns {
            let value = self.dml_value(&mut ctx, table, column, operand)?;
            sets.push(format!("{}={value}", self.dialect.quote_column_name(column)));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.dialect.quote_table_name(table),
            sets.join(", ")
        );
        let filter = self.prefixed_condition(&mut ctx, "WHERE", condition)?;
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        Ok(self.finish(sql, ctx))
    }

    /// `DELETE FROM table [WHERE condition]`.
    pub fn delete(&self, table: &str, condition: Option<&Condition>) -> QueryResult<Built> {
        let mut ctx = self.context();
        if let Some(condition) = condition {
            ctx.reserve_condition(condition);
        }
        let mut sql = format!("DELETE FROM {}", self.dialect.quote_table_name(table));
        let filter = self.prefixed_condition(&mut ctx, "WHERE", condition)?;
        if !filter.is_empty() {
            sql.push(' ');
            sql.push_str(&filter);
        }
        Ok(self.finish(sql, ctx))
    }

    pub fn truncate_table(&self, table: &str) -> Built {
        let sql = self
            .dialect
            .truncate_table(&self.dialect.quote_table_name(table));
        self.finish(sql, self.context())
    }

    pub fn drop_table(&self, table: &str) -> Built {
        let sql = format!("DROP TABLE {}", self.dialect.quote_table_name(table));
        self.finish(sql, self.context())
    }
}
