//! SQL Server lookups.
//!
//! There is no regular expression operator; `regex`/`iregex` keep the
//! default "not supported" error.

use super::{DatePart, LookupSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlLookups;

impl LookupSet for MssqlLookups {
    fn dialect_name(&self) -> &'static str {
        "mssql"
    }

    // DATEPART(dw, ...) is 1 = Sunday under the default DATEFIRST 7.
    fn extract(&self, part: DatePart, field: &str) -> String {
        let name = match part {
            DatePart::Year => "year",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
            DatePart::Second => "second",
            DatePart::WeekDay => "dw",
        };
        format!("DATEPART({name}, {field})")
    }
}
