//! SQLite lookups.
//!
//! SQLite has no native `ILIKE` and no built-in `REGEXP` function. Case-insensitive
//! patterns compare lowered operands; `REGEXP` expects the driver to register
//! [`regexp`] as a user function.

use super::{DatePart, LookupSet};
use crate::builder::BuildContext;
use crate::error::{QueryError, QueryResult};
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteLookups;

impl LookupSet for SqliteLookups {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }

    fn like(
        &self,
        ctx: &BuildContext<'_>,
        field: &str,
        placeholder: &str,
        case_insensitive: bool,
    ) -> String {
        let escape = ctx.dialect().like_escape();
        if case_insensitive {
            format!("LOWER({field}) LIKE LOWER({placeholder}){escape}")
        } else {
            format!("{field} LIKE {placeholder}{escape}")
        }
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
        let code = match part {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
            DatePart::Day => "%d",
            DatePart::Hour => "%H",
            DatePart::Minute => "%M",
            DatePart::Second => "%S",
            DatePart::WeekDay => "%w",
        };
        format!("strftime('{code}', {field})")
    }

    // strftime() yields zero-padded text, and %w counts Sunday as 0.
    fn extract_value(&self, part: DatePart, value: i64) -> Value {
        Value::Text(match part {
            DatePart::Year => format!("{value:04}"),
            DatePart::WeekDay => (value - 1).to_string(),
            _ => format!("{value:02}"),
        })
    }
}

/// The `REGEXP` user function: `text REGEXP pattern`.
///
/// Drivers register this under the name `regexp` with two arguments
/// (`pattern`, `text`), which is the argument order SQLite uses when it
/// rewrites `X REGEXP Y` to `regexp(Y, X)`.
pub fn regexp(pattern: &str, text: &str) -> QueryResult<bool> {
    let re = regex::Regex::new(pattern)
        .map_err(|e| QueryError::invalid_lookup("regex", e.to_string()))?;
    Ok(re.is_match(text))
}
