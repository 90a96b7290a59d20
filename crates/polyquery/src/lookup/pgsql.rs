//! PostgreSQL lookups.

use super::{DatePart, LookupSet};
use crate::builder::BuildContext;
use crate::error::QueryResult;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct PgsqlLookups;

impl LookupSet for PgsqlLookups {
    fn dialect_name(&self) -> &'static str {
        "pgsql"
    }

    fn like(
        &self,
        _ctx: &BuildContext<'_>,
        field: &str,
        placeholder: &str,
        case_insensitive: bool,
    ) -> String {
        let op = if case_insensitive { "ILIKE" } else { "LIKE" };
        format!("{field} {op} {placeholder}")
    }

    fn regex(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        pattern: &Value,
        case_insensitive: bool,
    ) -> QueryResult<String> {
        let ph = ctx.bind(field, pattern.clone());
        let op = if case_insensitive { "~*" } else { "~" };
        Ok(format!("{field} {op} {ph}"))
    }

    fn extract(&self, part: DatePart, field: &str) -> String {
        format!("EXTRACT({} FROM {field}::timestamp)", part.sql_name())
    }

    // DOW counts Sunday as 0.
    fn extract_value(&self, part: DatePart, value: i64) -> Value {
        match part {
            DatePart::WeekDay => Value::Int(value - 1),
            _ => Value::Int(value),
        }
    }
}
