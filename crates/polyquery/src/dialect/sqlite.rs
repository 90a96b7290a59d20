use super::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::lookup::LookupSet;
use crate::lookup::sqlite::SqliteLookups;
use crate::query::JoinKind;

/// SQLite.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn lookups(&self) -> &'static dyn LookupSet {
        &SqliteLookups
    }

    fn random_function(&self) -> &'static str {
        "RANDOM()"
    }

    fn like_escape(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn supports_row_value_in(&self) -> bool {
        false
    }

    // A compound SELECT does not accept parenthesized operands.
    fn parenthesize_union(&self) -> bool {
        false
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn check_join(&self, kind: &JoinKind) -> QueryResult<()> {
        match kind {
            JoinKind::Right => Err(QueryError::not_supported(self.name(), "RIGHT JOIN")),
            JoinKind::Full => Err(QueryError::not_supported(self.name(), "FULL JOIN")),
            _ => Ok(()),
        }
    }

    fn truncate_table(&self, quoted_table: &str) -> String {
        format!("DELETE FROM {quoted_table}")
    }
}
