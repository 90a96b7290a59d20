use super::mysql::MAX_LIMIT;
use super::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::lookup::LookupSet;
use crate::lookup::cubrid::CubridLookups;
use crate::query::JoinKind;

/// CUBRID.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cubrid;

impl Dialect for Cubrid {
    fn kind(&self) -> DialectKind {
        DialectKind::Cubrid
    }

    fn lookups(&self) -> &'static dyn LookupSet {
        &CubridLookups
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn quote_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some(MAX_LIMIT)
    }

    fn check_join(&self, kind: &JoinKind) -> QueryResult<()> {
        match kind {
            JoinKind::Full => Err(QueryError::not_supported(self.name(), "FULL JOIN")),
            _ => Ok(()),
        }
    }
}
