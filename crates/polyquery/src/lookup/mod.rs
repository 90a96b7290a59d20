//! Named field lookups (`field__lookup`) and their per-dialect translation.
//!
//! A [`Lookup`] is a comparison operator from a fixed vocabulary
//! (`exact`, `icontains`, `range`, `week_day`, ...). Each dialect owns one
//! [`LookupSet`] that turns `(field, value)` into a condition fragment and
//! binds the value into the current [`BuildContext`].
//!
//! Every lookup is callable on its own, which keeps the per-dialect matrix
//! testable without going through a whole query:
//!
//! ```ignore
//! use polyquery::builder::BuildContext;
//! use polyquery::dialect::DialectKind;
//! use polyquery::lookup::Lookup;
//!
//! let dialect = DialectKind::Pgsql.dialect();
//! let mut ctx = BuildContext::new(dialect, false);
//! let sql = dialect
//!     .lookups()
//!     .build(&mut ctx, Lookup::IContains, "\"name\"", &"ali".into())?;
//! assert_eq!(sql, "\"name\" ILIKE :name1");
//! ```

pub mod cubrid;
pub mod mssql;
pub mod mysql;
pub mod pgsql;
pub mod sqlite;

use crate::builder::BuildContext;
use crate::condition::{CompareOp, Operand};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use std::fmt;

/// A named lookup operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    Range,
    In,
    IsNull,
    Regex,
    IRegex,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    WeekDay,
    Search,
}

/// A date/time component extracted by the date-part lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Day of week, Sunday = 1 through Saturday = 7.
    WeekDay,
}

impl DatePart {
    /// Upper-case SQL name as used by `EXTRACT(...)`.
    pub fn sql_name(self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Month => "MONTH",
            DatePart::Day => "DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
            DatePart::WeekDay => "DOW",
        }
    }
}

/// Kind of LIKE pattern a lookup produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Contains,
    StartsWith,
    EndsWith,
}

impl Pattern {
    /// Escape `text` and wrap it with `%` wildcards.
    pub fn apply(self, text: &str) -> String {
        let escaped = escape_like(text);
        match self {
            Pattern::Contains => format!("%{escaped}%"),
            Pattern::StartsWith => format!("{escaped}%"),
            Pattern::EndsWith => format!("%{escaped}"),
        }
    }
}

/// Backslash-escape the LIKE wildcards `%`, `_` and the escape character itself.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl Lookup {
    pub const ALL: [Lookup; 25] = [
        Lookup::Exact,
        Lookup::IExact,
        Lookup::Contains,
        Lookup::IContains,
        Lookup::StartsWith,
        Lookup::IStartsWith,
        Lookup::EndsWith,
        Lookup::IEndsWith,
        Lookup::Gt,
        Lookup::Gte,
        Lookup::Lt,
        Lookup::Lte,
        Lookup::Range,
        Lookup::In,
        Lookup::IsNull,
        Lookup::Regex,
        Lookup::IRegex,
        Lookup::Year,
        Lookup::Month,
        Lookup::Day,
        Lookup::Hour,
        Lookup::Minute,
        Lookup::Second,
        Lookup::WeekDay,
        Lookup::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Range => "range",
            Lookup::In => "in",
            Lookup::IsNull => "isnull",
            Lookup::Regex => "regex",
            Lookup::IRegex => "iregex",
            Lookup::Year => "year",
            Lookup::Month => "month",
            Lookup::Day => "day",
            Lookup::Hour => "hour",
            Lookup::Minute => "minute",
            Lookup::Second => "second",
            Lookup::WeekDay => "week_day",
            Lookup::Search => "search",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Lookup::ALL.into_iter().find(|l| l.as_str() == name)
    }

    /// Split a `field__lookup` key. A key without a known suffix is `exact`.
    ///
    /// `"author__name__icontains"` splits at the last `__`, giving field
    /// `author__name`.
    pub fn split_key(key: &str) -> QueryResult<(String, Lookup)> {
        match key.rsplit_once("__") {
            None => Ok((key.to_string(), Lookup::Exact)),
            Some((field, name)) => {
                if field.is_empty() {
                    return Err(QueryError::malformed(format!("lookup key '{key}' has no field")));
                }
                let lookup = Lookup::parse(name)
                    .ok_or_else(|| QueryError::malformed(format!("unknown lookup '{name}'")))?;
                Ok((field.to_string(), lookup))
            }
        }
    }

    pub fn date_part(self) -> Option<DatePart> {
        Some(match self {
            Lookup::Year => DatePart::Year,
            Lookup::Month => DatePart::Month,
            Lookup::Day => DatePart::Day,
            Lookup::Hour => DatePart::Hour,
            Lookup::Minute => DatePart::Minute,
            Lookup::Second => DatePart::Second,
            Lookup::WeekDay => DatePart::WeekDay,
            _ => return None,
        })
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn scalar<'v>(lookup: Lookup, value: &'v Operand) -> QueryResult<&'v Value> {
    match value {
        Operand::Value(v) => Ok(v),
        _ => Err(QueryError::invalid_lookup(lookup.as_str(), "expected a single value")),
    }
}

fn text(lookup: Lookup, value: &Value) -> QueryResult<String> {
    match value {
        Value::Null => Err(QueryError::invalid_lookup(lookup.as_str(), "NULL is not a pattern")),
        v => Ok(v.to_string()),
    }
}

/// Per-dialect lookup translation.
///
/// `field` is always the already-quoted column expression. Default methods
/// produce portable SQL; dialects override what differs.
pub trait LookupSet: Send + Sync {
    /// Dialect name used in error messages.
    fn dialect_name(&self) -> &'static str;

    /// Translate one lookup, binding its value into `ctx`.
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        lookup: Lookup,
        field: &str,
        value: &Operand,
    ) -> QueryResult<String> {
        match lookup {
            Lookup::Exact => self.exact(ctx, field, scalar(lookup, value)?),
            Lookup::IExact => self.iexact(ctx, field, scalar(lookup, value)?),
            Lookup::Contains => self.pattern(ctx, field, lookup, Pattern::Contains, false, value),
            Lookup::IContains => self.pattern(ctx, field, lookup, Pattern::Contains, true, value),
            Lookup::StartsWith => {
                self.pattern(ctx, field, lookup, Pattern::StartsWith, false, value)
            }
            Lookup::IStartsWith => {
                self.pattern(ctx, field, lookup, Pattern::StartsWith, true, value)
            }
            Lookup::EndsWith => self.pattern(ctx, field, lookup, Pattern::EndsWith, false, value),
            Lookup::IEndsWith => self.pattern(ctx, field, lookup, Pattern::EndsWith, true, value),
            Lookup::Gt => self.compare(ctx, field, CompareOp::Gt, scalar(lookup, value)?),
            Lookup::Gte => self.compare(ctx, field, CompareOp::Gte, scalar(lookup, value)?),
            Lookup::Lt => self.compare(ctx, field, CompareOp::Lt, scalar(lookup, value)?),
            Lookup::Lte => self.compare(ctx, field, CompareOp::Lte, scalar(lookup, value)?),
            Lookup::Range => match value {
                Operand::List(bounds) if bounds.len() == 2 => {
                    self.range(ctx, field, &bounds[0], &bounds[1])
                }
                _ => Err(QueryError::invalid_lookup(
                    lookup.as_str(),
                    "expected a list of exactly two bounds",
                )),
            },
            Lookup::In => match value {
                Operand::List(values) => self.in_list(ctx, field, values),
                Operand::Value(v) => self.in_list(ctx, field, std::slice::from_ref(v)),
                _ => Err(QueryError::invalid_lookup(lookup.as_str(), "expected a list of values")),
            },
            Lookup::IsNull => self.isnull(field, scalar(lookup, value)?),
            Lookup::Regex => self.regex(ctx, field, scalar(lookup, value)?, false),
            Lookup::IRegex => self.regex(ctx, field, scalar(lookup, value)?, true),
            Lookup::Year
            | Lookup::Month
            | Lookup::Day
            | Lookup::Hour
            | Lookup::Minute
            | Lookup::Second
            | Lookup::WeekDay => match lookup.date_part() {
                Some(part) => self.date_part(ctx, field, part, scalar(lookup, value)?),
                None => Err(QueryError::malformed(format!("'{lookup}' is not a date part"))),
            },
            Lookup::Search => self.search(field),
        }
    }

    /// `field = value`; `NULL` becomes `IS NULL`.
    fn exact(&self, ctx: &mut BuildContext<'_>, field: &str, value: &Value) -> QueryResult<String> {
        if value.is_null() {
            return Ok(format!("{field} IS NULL"));
        }
        let ph = ctx.bind(field, value.clone());
        Ok(format!("{field} = {ph}"))
    }

    fn iexact(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        value: &Value,
    ) -> QueryResult<String> {
        if value.is_null() {
            return Ok(format!("{field} IS NULL"));
        }
        let ph = ctx.bind(field, value.clone());
        Ok(format!("LOWER({field}) = LOWER({ph})"))
    }

    /// Shared body of the `contains`/`startswith`/`endswith` families.
    fn pattern(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        lookup: Lookup,
        pattern: Pattern,
        case_insensitive: bool,
        value: &Operand,
    ) -> QueryResult<String> {
        let text = text(lookup, scalar(lookup, value)?)?;
        let ph = ctx.bind(field, Value::Text(pattern.apply(&text)));
        Ok(self.like(ctx, field, &ph, case_insensitive))
    }

    /// Render `field LIKE placeholder` for an already escaped pattern.
    fn like(
        &self,
        ctx: &BuildContext<'_>,
        field: &str,
        placeholder: &str,
        _case_insensitive: bool,
    ) -> String {
        format!("{field} LIKE {placeholder}{}", ctx.dialect().like_escape())
    }

    fn compare(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        op: CompareOp,
        value: &Value,
    ) -> QueryResult<String> {
        let ph = ctx.bind(field, value.clone());
        Ok(format!("{field} {} {ph}", op.as_str()))
    }

    fn range(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        low: &Value,
        high: &Value,
    ) -> QueryResult<String> {
        let low = ctx.bind(field, low.clone());
        let high = ctx.bind(field, high.clone());
        Ok(format!("{field} BETWEEN {low} AND {high}"))
    }

    fn in_list(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        values: &[Value],
    ) -> QueryResult<String> {
        if values.is_empty() {
            return Ok("1=0".to_string());
        }
        let phs: Vec<String> = values.iter().map(|v| ctx.bind(field, v.clone())).collect();
        Ok(format!("{field} IN ({})", phs.join(", ")))
    }

    fn isnull(&self, field: &str, value: &Value) -> QueryResult<String> {
        match value.as_bool() {
            Some(true) => Ok(format!("{field} IS NULL")),
            Some(false) => Ok(format!("{field} IS NOT NULL")),
            None => Err(QueryError::invalid_lookup("isnull", "expected a boolean")),
        }
    }

    fn regex(
        &self,
        _ctx: &mut BuildContext<'_>,
        _field: &str,
        _pattern: &Value,
        case_insensitive: bool,
    ) -> QueryResult<String> {
        let feature = if case_insensitive { "iregex lookup" } else { "regex lookup" };
        Err(QueryError::not_supported(self.dialect_name(), feature))
    }

    /// SQL expression extracting `part` from `field`.
    fn extract(&self, part: DatePart, field: &str) -> String;

    /// Convert the caller's number (Sunday = 1 for week days) into the value
    /// the extraction expression yields.
    fn extract_value(&self, _part: DatePart, value: i64) -> Value {
        Value::Int(value)
    }

    fn date_part(
        &self,
        ctx: &mut BuildContext<'_>,
        field: &str,
        part: DatePart,
        value: &Value,
    ) -> QueryResult<String> {
        let lookup = match part {
            DatePart::WeekDay => "week_day",
            _ => "date part",
        };
        let n = value
            .as_i64()
            .ok_or_else(|| {
                QueryError::invalid_lookup(lookup, format!("expected an integer, got {value}"))
            })?;
        if part == DatePart::WeekDay && !(1..=7).contains(&n) {
            return Err(QueryError::invalid_lookup(
                lookup,
                format!("{n} is outside 1 (Sunday) ..= 7 (Saturday)"),
            ));
        }
        let expr = self.extract(part, field);
        let ph = ctx.bind(field, self.extract_value(part, n));
        Ok(format!("{expr} = {ph}"))
    }

    fn search(&self, field: &str) -> QueryResult<String> {
        Err(QueryError::NotImplemented(format!(
            "search lookup on {field} ({} dialect)",
            self.dialect_name()
        )))
    }
}
