//! CUBRID lookups. Mostly MySQL-compatible.

use super::{DatePart, LookupSet};
use crate::builder::BuildContext;
use crate::error::QueryResult;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct CubridLookups;

impl LookupSet for CubridLookups {
    fn dialect_name(&self) -> &'static str {
        "cubrid"
    }

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
            DatePart::WeekDay => format!("DAYOFWEEK({field})"),
            _ => format!("EXTRACT({} FROM {field})", part.sql_name()),
        }
    }
}
