use super::{Dialect, DialectKind};
use crate::lookup::LookupSet;
use crate::lookup::mssql::MssqlLookups;

/// Microsoft SQL Server (2012 and later).
#[derive(Debug, Default, Clone, Copy)]
pub struct Mssql;

impl Dialect for Mssql {
    fn kind(&self) -> DialectKind {
        DialectKind::Mssql
    }

    fn lookups(&self) -> &'static dyn LookupSet {
        &MssqlLookups
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn random_function(&self) -> &'static str {
        "NEWID()"
    }

    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn supports_row_value_in(&self) -> bool {
        false
    }

    /// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`.
    ///
    /// A limit without offset still needs `OFFSET 0 ROWS`; a zero offset
    /// without limit renders nothing.
    fn build_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let offset = offset.filter(|o| *o > 0);
        match (limit, offset) {
            (Some(l), o) => format!("OFFSET {} ROWS FETCH NEXT {l} ROWS ONLY", o.unwrap_or(0)),
            (None, Some(o)) => format!("OFFSET {o} ROWS"),
            (None, None) => String::new(),
        }
    }

    fn select_exists(&self, sql: &str) -> String {
        format!("SELECT CASE WHEN EXISTS({sql}) THEN 1 ELSE 0 END")
    }
}
