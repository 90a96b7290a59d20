//! # polyquery
//!
//! A structured SQL query builder that renders one query model for several
//! database engines: SQLite, PostgreSQL, MySQL, SQL Server and CUBRID.
//!
//! ## Features
//!
//! - **One model, many dialects**: a [`Query`] is plain data; a [`QueryBuilder`]
//!   for a [`Dialect`] turns it into SQL plus named parameters
//! - **Condition trees**: hash, AND/OR/NOT, IN, BETWEEN, LIKE, EXISTS, raw SQL,
//!   or a JSON operator array (`["and", {"a": 1}, [">", "b", 2]]`)
//! - **Field lookups**: `name__icontains`, `created__year`, `pub_date__week_day`
//!   translated per dialect
//! - **Safe by default**: values are bound as `:name` placeholders, never
//!   interpolated (unless inline mode is requested)
//! - **Schema-aware DML**: INSERT/UPDATE values are cast with the table's
//!   [`TableSchema`] when one is attached
//! - **Bring your own driver**: implement [`Connection`] and run queries
//!   through [`Command`]
//!
//! ## Example
//!
//! ```ignore
//! use polyquery::prelude::*;
//!
//! let query = Query::new()
//!     .select("id, name")
//!     .from("customer")
//!     .where_(Condition::hash([("status", 1)]))
//!     .and_where(Condition::lookup_key("name__istartswith", "al")?)
//!     .order_by("id", Order::Desc)
//!     .limit(10);
//!
//! for kind in DialectKind::ALL {
//!     let built = QueryBuilder::for_kind(kind).build(&query)?;
//!     println!("{kind}: {}", built.sql);
//! }
//! ```

pub mod builder;
pub mod condition;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod lookup;
pub mod params;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod value;

#[cfg(feature = "tracing")]
pub mod trace;

pub use builder::{BuildContext, Built, PlaceholderStyle, QueryBuilder};
pub use condition::{CompareOp, Condition, InValues, LikeOp, Operand};
pub use config::{ConnectionConfig, DatabaseConfig};
pub use connection::{Command, Connection, ConnectionRegistry, Row};
pub use dialect::{Dialect, DialectKind};
pub use error::{QueryError, QueryResult};
pub use expression::Expression;
pub use lookup::{DatePart, Lookup, LookupSet};
pub use params::Params;
pub use query::{Distinct, JoinKind, Order, OrderItem, Query};
pub use schema::{ColumnSchema, ColumnType, Schema, SchemaRegistry, TableSchema};
pub use value::Value;

#[cfg(feature = "tracing")]
pub use trace::SqlTracer;
