//! Raw SQL fragments that bypass quoting.

use crate::params::Params;
use crate::value::Value;
use std::fmt;

/// A raw SQL fragment with its own bound parameters.
///
/// The builder never quotes or rewrites the text of an `Expression`; its
/// params are merged into the statement's parameter map as-is.
///
/// # Example
/// ```ignore
/// let e = Expression::new("NOW()");
/// let e = Expression::with_params("age > :min_age", Params::new().with("min_age", 18));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    sql: String,
    params: Params,
}

impl Expression {
    /// Create an expression without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    /// Create an expression carrying parameters.
    pub fn with_params(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Add one parameter.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for Expression {
    fn from(sql: &str) -> Self {
        Expression::new(sql)
    }
}

impl From<String> for Expression {
    fn from(sql: String) -> Self {
        Expression::new(sql)
    }
}
