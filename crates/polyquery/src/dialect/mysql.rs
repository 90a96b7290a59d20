use super::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::lookup::LookupSet;
use crate::lookup::mysql::MysqlLookups;
use crate::query::JoinKind;

/// Largest LIMIT MySQL accepts, used for offset-only queries.
pub(super) const MAX_LIMIT: &str = "18446744073709551615";

/// MySQL and MariaDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mysql;

impl Dialect for Mysql {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn lookups(&self) -> &'static dyn LookupSet {
        &MysqlLookups
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

    fn default_values_insert(&self, quoted_table: &str) -> String {
        format!("INSERT INTO {quoted_table} () VALUES ()")
    }
}
