//! Reading table metadata from a live connection.
//!
//! Each dialect has its own catalog query; the rows it returns are turned
//! into a [`TableSchema`] by [`parse_columns`], which is kept separate from
//! I/O so it can be fed canned rows.

use super::{ColumnSchema, TableSchema};
use crate::connection::{Connection, Row};
use crate::dialect::{Dialect, DialectKind};
use crate::error::{QueryError, QueryResult};
use crate::params::Params;
use crate::value::Value;

/// Catalog query listing table names.
pub fn table_names_sql(kind: DialectKind, schema: Option<&str>) -> String {
    let dialect = kind.dialect();
    match kind {
        DialectKind::Sqlite => {
            "SELECT DISTINCT tbl_name FROM sqlite_master WHERE tbl_name<>'sqlite_sequence' ORDER BY tbl_name"
                .to_string()
        }
        DialectKind::Mysql => match schema {
            Some(s) => format!("SHOW TABLES FROM {}", dialect.quote_simple_table_name(s)),
            None => "SHOW TABLES".to_string(),
        },
        DialectKind::Pgsql => format!(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = {} AND table_type = 'BASE TABLE' ORDER BY table_name",
            dialect.quote_value(schema.unwrap_or("public"))
        ),
        DialectKind::Mssql => format!(
            "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = {} AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME",
            dialect.quote_value(schema.unwrap_or("dbo"))
        ),
        DialectKind::Cubrid => {
            "SELECT class_name FROM db_class WHERE is_system_class = 'NO' AND class_type = 'CLASS' ORDER BY class_name"
                .to_string()
        }
    }
}

/// Catalog query describing the columns of one table.
pub fn columns_sql(kind: DialectKind, table: &str, schema: Option<&str>) -> String {
    let dialect = kind.dialect();
    let qualified = match schema {
        Some(s) => format!("{s}.{table}"),
        None => table.to_string(),
    };
    match kind {
        DialectKind::Sqlite => format!(
            "PRAGMA table_info({})",
            dialect.quote_simple_table_name(table)
        ),
        DialectKind::Mysql | DialectKind::Cubrid => {
            format!("SHOW FULL COLUMNS FROM {}", dialect.quote_table_name(&qualified))
        }
        DialectKind::Pgsql => format!(
            "SELECT c.column_name, c.data_type, c.udt_name, c.is_nullable, c.column_default, \
             c.character_maximum_length, c.numeric_precision, c.numeric_scale, \
             CASE WHEN tc.constraint_type = 'PRIMARY KEY' THEN 1 ELSE 0 END AS is_pkey \
             FROM information_schema.columns c \
             LEFT JOIN information_schema.key_column_usage kcu \
             ON kcu.table_schema = c.table_schema AND kcu.table_name = c.table_name \
             AND kcu.column_name = c.column_name \
             LEFT JOIN information_schema.table_constraints tc \
             ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
             AND tc.constraint_type = 'PRIMARY KEY' \
             WHERE c.table_schema = {} AND c.table_name = {} \
             ORDER BY c.ordinal_position",
            dialect.quote_value(schema.unwrap_or("public")),
            dialect.quote_value(table)
        ),
        DialectKind::Mssql => {
            let schema = schema.unwrap_or("dbo");
            format!(
                "SELECT c.COLUMN_NAME AS column_name, c.DATA_TYPE AS data_type, c.IS_NULLABLE AS is_nullable, \
                 c.COLUMN_DEFAULT AS column_default, \
                 c.CHARACTER_MAXIMUM_LENGTH AS character_maximum_length, \
                 c.NUMERIC_PRECISION AS numeric_precision, c.NUMERIC_SCALE AS numeric_scale, \
                 COLUMNPROPERTY(OBJECT_ID(c.TABLE_SCHEMA + '.' + c.TABLE_NAME), c.COLUMN_NAME, \
                 'IsIdentity') AS is_identity, \
                 CASE WHEN tc.CONSTRAINT_TYPE = 'PRIMARY KEY' THEN 1 ELSE 0 END AS is_pkey \
                 FROM INFORMATION_SCHEMA.COLUMNS c \
                 LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
                 ON kcu.TABLE_SCHEMA = c.TABLE_SCHEMA AND kcu.TABLE_NAME = c.TABLE_NAME \
                 AND kcu.COLUMN_NAME = c.COLUMN_NAME \
                 LEFT JOIN INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                 ON tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
                 AND tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
                 WHERE c.TABLE_SCHEMA = {} AND c.TABLE_NAME = {} \
                 ORDER BY c.ORDINAL_POSITION",
                dialect.quote_value(schema),
                dialect.quote_value(table)
            )
        }
    }
}

/// Case-insensitive cell lookup; the first matching key wins.
fn cell<'r>(row: &'r Row, names: &[&str]) -> Option<&'r Value> {
    names.iter().find_map(|name| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    })
}

fn cell_str(row: &Row, names: &[&str]) -> Option<String> {
    cell(row, names).map(ToString::to_string)
}

fn cell_bool(row: &Row, names: &[&str]) -> bool {
    match cell(row, names) {
        Some(Value::Text(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true") || s == "1"
        }
        Some(v) => v.as_bool().unwrap_or(false),
        None => false,
    }
}

fn cell_u32(row: &Row, names: &[&str]) -> Option<u32> {
    cell(row, names)
        .and_then(Value::as_i64)
        .and_then(|n| u32::try_from(n).ok())
}

/// Strip casts, parentheses and quotes from a catalog default expression.
///
/// `('abc'::character varying)` becomes `abc`, `((0))` becomes `0`.
/// Function calls (`now()`, `CURRENT_TIMESTAMP`) yield `None`.
fn parse_default(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    while text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }
    if let Some((head, _)) = text.split_once("::") {
        text = head.trim();
    }
    if text.eq_ignore_ascii_case("null") {
        return None;
    }
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Some(text[1..text.len() - 1].replace("''", "'"));
    }
    if text.contains('(') || text.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    Some(text.to_string())
}

/// `nextval('user_id_seq'::regclass)` → `user_id_seq`.
fn sequence_from_default(raw: &str) -> Option<String> {
    let rest = raw.trim().strip_prefix("nextval(")?;
    let start = rest.find('\'')? + 1;
    let end = start + rest[start..].find('\'')?;
    Some(rest[start..end].to_string())
}

fn parse_column(kind: DialectKind, row: &Row) -> QueryResult<(ColumnSchema, Option<String>)> {
    let name = cell_str(row, &["column_name", "field", "name"])
        .ok_or_else(|| QueryError::Schema("catalog row has no column name".to_string()))?;

    let (db_type, allow_null, is_pk, raw_default, auto_increment) = match kind {
        DialectKind::Sqlite => (
            cell_str(row, &["type"]).unwrap_or_default(),
            !cell_bool(row, &["notnull"]),
            cell(row, &["pk"]).and_then(Value::as_i64).unwrap_or(0) > 0,
            cell_str(row, &["dflt_value"]),
            false,
        ),
        DialectKind::Mysql | DialectKind::Cubrid => (
            cell_str(row, &["type"]).unwrap_or_default(),
            cell_bool(row, &["null"]),
            cell_str(row, &["key"]).is_some_and(|k| k.contains("PRI")),
            cell_str(row, &["default"]),
            cell_str(row, &["extra"]).is_some_and(|e| e.contains("auto_increment")),
        ),
        DialectKind::Pgsql => {
            let data_type = cell_str(row, &["data_type"]).unwrap_or_default();
            let db_type = if data_type.eq_ignore_ascii_case("USER-DEFINED") {
                cell_str(row, &["udt_name"]).unwrap_or(data_type)
            } else {
                data_type
            };
            let default = cell_str(row, &["column_default"]);
            let auto = default.as_deref().is_some_and(|d| d.starts_with("nextval("));
            (
                db_type,
                cell_bool(row, &["is_nullable"]),
                cell_bool(row, &["is_pkey"]),
                default,
                auto,
            )
        }
        DialectKind::Mssql => (
            cell_str(row, &["data_type"]).unwrap_or_default(),
            cell_bool(row, &["is_nullable"]),
            cell_bool(row, &["is_pkey"]),
            cell_str(row, &["column_default"]),
            cell_bool(row, &["is_identity"]),
        ),
    };

    let mut column = ColumnSchema::from_db_type(kind, name, &db_type);
    column.allow_null = allow_null && !is_pk;
    column.is_primary_key = is_pk;
    column.auto_increment = auto_increment;
    if matches!(kind, DialectKind::Pgsql | DialectKind::Mssql) {
        if let Some(size) = cell_u32(row, &["character_maximum_length"]) {
            column.size = Some(size);
        }
        if let Some(precision) = cell_u32(row, &["numeric_precision"]) {
            column.precision = Some(precision);
        }
        if let Some(scale) = cell_u32(row, &["numeric_scale"]) {
            column.scale = Some(scale);
        }
    }

    let sequence = if auto_increment {
        raw_default.as_deref().and_then(sequence_from_default)
    } else {
        None
    };
    let default = match kind {
        // SHOW COLUMNS reports defaults unquoted
        DialectKind::Mysql | DialectKind::Cubrid => raw_default
            .clone()
            .filter(|d| !d.to_ascii_uppercase().starts_with("CURRENT_")),
        _ => raw_default.as_deref().and_then(parse_default),
    };
    if let Some(default) = default.filter(|_| !auto_increment) {
        column.default = Some(column.typecast(&Value::Text(default)));
    }
    Ok((column, sequence))
}

/// Turn catalog rows from [`columns_sql`] into a table schema.
pub fn parse_columns(
    kind: DialectKind,
    table: &str,
    schema: Option<&str>,
    rows: &[Row],
) -> QueryResult<TableSchema> {
    if rows.is_empty() {
        return Err(QueryError::Schema(format!("table '{table}' does not exist")));
    }
    let mut table_schema = TableSchema::new(table);
    if let Some(schema) = schema {
        table_schema = table_schema.with_schema_name(schema);
    }
    for row in rows {
        let (column, sequence) = parse_column(kind, row)?;
        if sequence.is_some() && table_schema.sequence_name.is_none() {
            table_schema.sequence_name = sequence;
        }
        table_schema.add_column(column);
    }
    Ok(table_schema)
}

/// Load one table's schema through `conn`.
pub fn load_table_schema(
    conn: &dyn Connection,
    table: &str,
    schema: Option<&str>,
) -> QueryResult<TableSchema> {
    let kind = conn.dialect().kind();
    let rows = conn.query(&columns_sql(kind, table, schema), &Params::new())?;
    parse_columns(kind, table, schema, &rows)
}

/// List table names through `conn`.
pub fn load_table_names(conn: &dyn Connection, schema: Option<&str>) -> QueryResult<Vec<String>> {
    let kind = conn.dialect().kind();
    let rows = conn.query(&table_names_sql(kind, schema), &Params::new())?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().map(|(_, v)| v.to_string()))
        .collect())
}
