//! MySQL lookups.

use super::{DatePart, LookupSet};
use crate::builder::BuildContext;
use crate::error::QueryResult;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlLookups;

impl LookupSet for MysqlLookups {
    fn dialect_name(&self) -> &'static str {
        "mysql"
    }

    // No ILIKE: the case-insensitive variants fall back to the default LIKE,
    // which follows the column collation.

    fn regex(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        pattern: &Value,
        _case_insensitive: bool,
    ) -> QueryResult<String> {
        let ph = ctx.bind(field, pattern.clone());
        Ok(format!("{field} REGEXP {ph}"))
    }

    fn extract(&self, part: DatePart, field: &str) -> String {
        match part {
            // DAYOFWEEK() is already 1 = Sunday.
            DatePart::WeekDay => format!("DAYOFWEEK({field})"),
            _ => format!("EXTRACT({} FROM {field})", part.sql_name()),
        }
    }
}
