//! Convenient imports for typical `polyquery` usage.
//!
//! ```ignore
//! use polyquery::prelude::*;
//! ```

pub use crate::{
    Built, Command, Condition, Connection, DialectKind, Expression, Lookup, Order, Params, Query,
    QueryBuilder, QueryError, QueryResult, Row, Value,
};
