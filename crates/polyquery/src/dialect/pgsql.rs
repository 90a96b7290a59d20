use super::{Dialect, DialectKind};
use crate::error::QueryResult;
use crate::lookup::LookupSet;
use crate::lookup::pgsql::PgsqlLookups;
use crate::query::Distinct;
use crate::value::Value;

/// PostgreSQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pgsql;

impl Dialect for Pgsql {
    fn kind(&self) -> DialectKind {
        DialectKind::Pgsql
    }

    fn lookups(&self) -> &'static dyn LookupSet {
        &PgsqlLookups
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn bool_value(&self, value: bool) -> Value {
        Value::Text(if value { "TRUE" } else { "FALSE" }.to_string())
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn ilike_operator(&self) -> &'static str {
        "ILIKE"
    }

    fn build_distinct(&self, distinct: &Distinct) -> QueryResult<String> {
        match distinct {
            Distinct::No => Ok(String::new()),
            Distinct::All => Ok("DISTINCT".to_string()),
            Distinct::On(columns) => {
                let cols: Vec<String> = columns.iter().map(|c| self.quote_column_name(c)).collect();
                Ok(format!("DISTINCT ON ({})", cols.join(", ")))
            }
        }
    }
}
