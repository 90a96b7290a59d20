//! Table and column metadata.
//!
//! The builder consults a [`Schema`] only to cast INSERT/UPDATE values to
//! the column's type. [`SchemaRegistry`] is the in-memory implementation;
//! [`introspect`] reads metadata from a live connection.

pub mod introspect;

use crate::dialect::DialectKind;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Abstract column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Money,
    Boolean,
    Char,
    String,
    Text,
    Binary,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
}

impl ColumnType {
    /// Map a database type name (`varchar(255)`, `int unsigned`, `timestamptz`) to a type tag.
    pub fn from_db_type(kind: DialectKind, db_type: &str) -> Self {
        let lower = db_type.trim().to_ascii_lowercase();
        if kind == DialectKind::Mysql && lower.starts_with("tinyint(1)") {
            return ColumnType::Boolean;
        }
        if kind == DialectKind::Mssql && lower == "bit" {
            return ColumnType::Boolean;
        }
        let base = lower
            .split('(')
            .next()
            .unwrap_or_default()
            .trim_end_matches(" unsigned")
            .trim();

        match base {
            "tinyint" => ColumnType::TinyInt,
            "smallint" | "int2" | "smallserial" => ColumnType::SmallInt,
            "int" | "integer" | "int4" | "mediumint" | "serial" | "bit" => ColumnType::Integer,
            "bigint" | "int8" | "bigserial" => ColumnType::BigInt,
            "float" | "real" | "float4" => ColumnType::Float,
            "double" | "double precision" | "float8" => ColumnType::Double,
            "decimal" | "numeric" => ColumnType::Decimal,
            "money" | "smallmoney" => ColumnType::Money,
            "bool" | "boolean" => ColumnType::Boolean,
            "char" | "nchar" | "character" | "bpchar" => ColumnType::Char,
            "text" | "tinytext" | "mediumtext" | "longtext" | "ntext" | "clob" | "xml" => {
                ColumnType::Text
            }
            "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea"
            | "image" | "bit varying" => ColumnType::Binary,
            "date" => ColumnType::Date,
            "time" | "time without time zone" | "time with time zone" | "timetz" => {
                ColumnType::Time
            }
            "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => ColumnType::DateTime,
            "timestamp" | "timestamp without time zone" | "timestamp with time zone"
            | "timestamptz" => ColumnType::Timestamp,
            "json" | "jsonb" => ColumnType::Json,
            _ => ColumnType::String,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::TinyInt | ColumnType::SmallInt | ColumnType::Integer | ColumnType::BigInt
        )
    }

    /// Types whose empty string is a meaningful value.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ColumnType::Char | ColumnType::String | ColumnType::Text | ColumnType::Binary
        )
    }
}

/// Metadata of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnType,
    /// Type name as reported by the database.
    pub db_type: String,
    pub allow_null: bool,
    pub is_primary_key: bool,
    pub default: Option<Value>,
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub auto_increment: bool,
}

impl ColumnSchema {
    /// A nullable, non-key column.
    pub fn new(name: impl Into<String>, kind: ColumnType, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            db_type: db_type.into(),
            allow_null: true,
            is_primary_key: false,
            default: None,
            size: None,
            precision: None,
            scale: None,
            unsigned: false,
            auto_increment: false,
        }
    }

    /// Derive type, size, precision, scale and signedness from a db type name.
    pub fn from_db_type(dialect: DialectKind, name: impl Into<String>, db_type: &str) -> Self {
        let mut column = Self::new(name, ColumnType::from_db_type(dialect, db_type), db_type);
        column.unsigned = db_type.to_ascii_lowercase().contains("unsigned");
        if let Some((_, rest)) = db_type.split_once('(') {
            let args: Vec<u32> = rest
                .trim_end_matches(|c: char| c != ')')
                .trim_end_matches(')')
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            column.size = args.first().copied();
            column.precision = args.first().copied();
            column.scale = args.get(1).copied();
        }
        column
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.allow_null = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = Some(self.typecast(&value));
        self
    }

    /// Convert a value to this column's type before it is bound.
    ///
    /// Empty strings become `NULL` for nullable non-text columns; values that
    /// cannot be converted are returned unchanged.
    pub fn typecast(&self, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        if self.allow_null
            && !self.kind.is_textual()
            && matches!(value, Value::Text(s) if s.is_empty())
        {
            return Value::Null;
        }
        match self.kind {
            ColumnType::Boolean => value.as_bool().map_or_else(|| value.clone(), Value::Bool),
            k if k.is_integer() => value.as_i64().map_or_else(|| value.clone(), Value::Int),
            ColumnType::Float | ColumnType::Double => {
                value.as_f64().map_or_else(|| value.clone(), Value::Float)
            }
            ColumnType::Decimal | ColumnType::Money => match value {
                Value::Int(_) | Value::Float(_) => Value::Text(value.to_string()),
                _ => value.clone(),
            },
            ColumnType::Char | ColumnType::String | ColumnType::Text => match value {
                Value::Int(_) | Value::Float(_) | Value::Bool(_) => Value::Text(value.to_string()),
                _ => value.clone(),
            },
            _ => value.clone(),
        }
    }
}

/// Metadata of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub schema_name: Option<String>,
    /// Columns in table order.
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Vec<String>,
    /// Sequence backing an auto-increment key (PostgreSQL).
    pub sequence_name: Option<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_name: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            sequence_name: None,
        }
    }

    pub fn with_schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// `schema.table`, or the bare name without a schema.
    pub fn full_name(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Add a column; primary-key columns are recorded in `primary_key`.
    pub fn add_column(&mut self, column: ColumnSchema) {
        if column.is_primary_key && !self.primary_key.contains(&column.name) {
            self.primary_key.push(column.name.clone());
        }
        self.columns.push(column);
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.add_column(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Source of table metadata.
pub trait Schema: Send + Sync {
    /// Look a table up by name (`table` or `schema.table`).
    fn table_schema(&self, name: &str) -> Option<&TableSchema>;

    fn column_type(&self, table: &str, column: &str) -> Option<ColumnType> {
        self.table_schema(table)
            .and_then(|t| t.column(column))
            .map(|c| c.kind)
    }
}

/// In-memory schema keyed by schema name, then table name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, HashMap<String, TableSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any previous one with the same name.
    pub fn register_table(&mut self, table: TableSchema) {
        let schema = table.schema_name.clone().unwrap_or_default();
        let name = table.name.clone();
        self.tables.entry(schema).or_default().insert(name, table);
    }

    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.register_table(table);
        self
    }

    pub fn get_table(&self, schema: &str, name: &str) -> Option<&TableSchema> {
        self.tables.get(schema).and_then(|by_name| by_name.get(name))
    }

    /// Find a table by bare name, preferring tables without a schema.
    pub fn find_table(&self, name: &str) -> Option<&TableSchema> {
        if let Some(t) = self.get_table("", name) {
            return Some(t);
        }
        self.tables.values().find_map(|by_name| by_name.get(name))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values().flat_map(|by_name| by_name.values())
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }
}

impl Schema for SchemaRegistry {
    fn table_schema(&self, name: &str) -> Option<&TableSchema> {
        let name = name.trim_start_matches("{{").trim_end_matches("}}");
        match name.split_once('.') {
            Some((schema, table)) => self.get_table(schema, table),
            None => self.find_table(name),
        }
    }
}
