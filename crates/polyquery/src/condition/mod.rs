//! Condition AST for WHERE / HAVING / JOIN ON predicates.
//!
//! A [`Condition`] is a tree of typed nodes: hash shorthand (`column => value`),
//! boolean groups (AND/OR/NOT), fixed-arity operators (BETWEEN, IN, LIKE,
//! EXISTS, comparisons), raw SQL and named lookups. The builder compiles it
//! into dialect-specific SQL; see [`crate::builder::QueryBuilder::build_condition`].
//!
//! # Example
//! ```ignore
//! use polyquery::{Condition, Value};
//!
//! let c = Condition::hash([("status", Value::from(1))])
//!     .and_with(Condition::between("age", 18, 65))
//!     .and_with(Condition::or(vec![
//!         Condition::like("name", "ali"),
//!         Condition::in_list("role", vec!["admin", "owner"]),
//!     ]));
//! ```

mod json;

use crate::error::{QueryError, QueryResult};
use crate::expression::Expression;
use crate::lookup::Lookup;
use crate::params::Params;
use crate::query::Query;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};

/// Right-hand side of a hash pair, comparison or lookup.
#[derive(Clone, Debug)]
pub enum Operand {
    /// A single bound value (`Null` renders as `IS NULL` in hash form).
    Value(Value),
    /// A list of values (renders as `IN (...)` in hash form).
    List(Vec<Value>),
    /// A sub-query.
    Query(Box<Query>),
    /// A raw expression, never quoted.
    Expr(Expression),
}

macro_rules! impl_operand_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(v.into())
                }
            }
        )*
    };
}

impl_operand_from_value!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, &String,
    NaiveDateTime, NaiveDate
);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Operand::Value(v.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(v: Vec<T>) -> Self {
        Operand::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Query> for Operand {
    fn from(q: Query) -> Self {
        Operand::Query(Box::new(q))
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expr(e)
    }
}

/// Relational operators with exactly two operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Parse an operator token. `!=` is accepted as an alias of `<>`.
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "=" => CompareOp::Eq,
            "<>" | "!=" => CompareOp::Ne,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Gte,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Lte,
            _ => return None,
        })
    }
}

/// The LIKE operator family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeOp {
    Like,
    NotLike,
    OrLike,
    OrNotLike,
    Ilike,
    NotIlike,
}

impl LikeOp {
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "like" => LikeOp::Like,
            "not like" => LikeOp::NotLike,
            "or like" => LikeOp::OrLike,
            "or not like" => LikeOp::OrNotLike,
            "ilike" => LikeOp::Ilike,
            "not ilike" => LikeOp::NotIlike,
            _ => return None,
        })
    }

    /// The same operator with its negation flipped.
    pub fn negate(self) -> Self {
        match self {
            LikeOp::Like => LikeOp::NotLike,
            LikeOp::NotLike => LikeOp::Like,
            LikeOp::OrLike => LikeOp::OrNotLike,
            LikeOp::OrNotLike => LikeOp::OrLike,
            LikeOp::Ilike => LikeOp::NotIlike,
            LikeOp::NotIlike => LikeOp::Ilike,
        }
    }

    pub fn is_negated(self) -> bool {
        matches!(self, LikeOp::NotLike | LikeOp::OrNotLike | LikeOp::NotIlike)
    }

    pub fn is_case_insensitive(self) -> bool {
        matches!(self, LikeOp::Ilike | LikeOp::NotIlike)
    }

    /// Values of an OR-variant are joined with `OR`, all others with `AND`.
    pub fn joiner(self) -> &'static str {
        match self {
            LikeOp::OrLike | LikeOp::OrNotLike => " OR ",
            _ => " AND ",
        }
    }
}

/// Right-hand side of an IN / NOT IN condition.
#[derive(Clone, Debug)]
pub enum InValues {
    /// Values for a single column.
    List(Vec<Value>),
    /// Value tuples for a multi-column IN.
    Rows(Vec<Vec<Value>>),
    /// A sub-query.
    Query(Box<Query>),
}

/// A WHERE / HAVING / ON predicate.
#[derive(Clone, Debug)]
pub enum Condition {
    /// `column => operand` pairs joined with AND.
    Hash(Vec<(String, Operand)>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    In {
        columns: Vec<String>,
        values: InValues,
        negated: bool,
    },
    Like {
        op: LikeOp,
        column: String,
        values: Vec<Value>,
        /// Use the values verbatim instead of escaping and wrapping them in `%`.
        raw_pattern: bool,
    },
    Exists {
        query: Box<Query>,
        negated: bool,
    },
    Compare {
        column: String,
        op: CompareOp,
        value: Operand,
    },
    /// Raw SQL passed through verbatim, with explicit params.
    Raw { sql: String, params: Params },
    Expr(Expression),
    /// A named lookup translated by the dialect's lookup set.
    Lookup {
        field: String,
        lookup: Lookup,
        value: Operand,
    },
}

impl Condition {
    // ==================== Hash & groups ====================

    /// Hash shorthand: each pair becomes `col=value`, `col IN (...)` or `col IS NULL`.
    pub fn hash<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        Condition::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(conditions)
    }

    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Combine with another condition using AND, flattening nested ANDs.
    pub fn and_with(self, other: Condition) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        match self {
            Condition::And(mut items) => {
                items.push(other);
                Condition::And(items)
            }
            this => Condition::And(vec![this, other]),
        }
    }

    /// Combine with another condition using OR, flattening nested ORs.
    pub fn or_with(self, other: Condition) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        match self {
            Condition::Or(mut items) => {
                items.push(other);
                Condition::Or(items)
            }
            this => Condition::Or(vec![this, other]),
        }
    }

    // ==================== Operators ====================

    pub fn eq(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Ne, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Gt, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Gte, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Lt, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::cmp(column, CompareOp::Lte, value)
    }

    pub fn cmp(column: impl Into<String>, op: CompareOp, value: impl Into<Operand>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a comparison from an operator token such as `">="`.
    pub fn compare(
        op: &str,
        column: impl Into<String>,
        value: impl Into<Operand>,
    ) -> QueryResult<Self> {
        let op = CompareOp::parse(op)
            .ok_or_else(|| QueryError::malformed(format!("unknown comparison operator '{op}'")))?;
        Ok(Self::cmp(column, op, value))
    }

    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Condition::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    pub fn not_between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Condition::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    pub fn in_list<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Condition::In {
            columns: vec![column.into()],
            values: InValues::List(values.into_iter().map(Into::into).collect()),
            negated: false,
        }
    }

    pub fn not_in<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Condition::In {
            columns: vec![column.into()],
            values: InValues::List(values.into_iter().map(Into::into).collect()),
            negated: true,
        }
    }

    pub fn in_query(column: impl Into<String>, query: Query) -> Self {
        Condition::In {
            columns: vec![column.into()],
            values: InValues::Query(Box::new(query)),
            negated: false,
        }
    }

    pub fn not_in_query(column: impl Into<String>, query: Query) -> Self {
        Condition::In {
            columns: vec![column.into()],
            values: InValues::Query(Box::new(query)),
            negated: true,
        }
    }

    /// Multi-column IN: `(a, b) IN ((1, 2), (3, 4))`.
    pub fn in_rows<C: Into<String>>(columns: Vec<C>, rows: Vec<Vec<Value>>) -> Self {
        Condition::In {
            columns: columns.into_iter().map(Into::into).collect(),
            values: InValues::Rows(rows),
            negated: false,
        }
    }

    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::like_op(LikeOp::Like, column, vec![value.into()])
    }

    pub fn not_like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::like_op(LikeOp::NotLike, column, vec![value.into()])
    }

    pub fn ilike(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::like_op(LikeOp::Ilike, column, vec![value.into()])
    }

    pub fn not_ilike(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::like_op(LikeOp::NotIlike, column, vec![value.into()])
    }

    /// `column LIKE v1 OR column LIKE v2 ...`
    pub fn or_like<T: Into<Value>>(column: impl Into<String>, values: Vec<T>) -> Self {
        Self::like_op(
            LikeOp::OrLike,
            column,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn like_op(op: LikeOp, column: impl Into<String>, values: Vec<Value>) -> Self {
        Condition::Like {
            op,
            column: column.into(),
            values,
            raw_pattern: false,
        }
    }

    /// Keep LIKE values verbatim (no `%` wrapping, no escaping).
    ///
    /// Has no effect on other condition kinds.
    pub fn raw_pattern(self) -> Self {
        match self {
            Condition::Like {
                op, column, values, ..
            } => Condition::Like {
                op,
                column,
                values,
                raw_pattern: true,
            },
            other => other,
        }
    }

    pub fn exists(query: Query) -> Self {
        Condition::Exists {
            query: Box::new(query),
            negated: false,
        }
    }

    pub fn not_exists(query: Query) -> Self {
        Condition::Exists {
            query: Box::new(query),
            negated: true,
        }
    }

    // ==================== Raw & lookups ====================

    /// Raw SQL, passed through verbatim.
    ///
    /// # Safety
    /// Be careful with SQL injection when using raw conditions.
    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    /// Raw SQL with named params.
    pub fn raw_with_params(sql: impl Into<String>, params: Params) -> Self {
        Condition::Raw {
            sql: sql.into(),
            params,
        }
    }

    pub fn expr(expression: Expression) -> Self {
        Condition::Expr(expression)
    }

    pub fn lookup(field: impl Into<String>, lookup: Lookup, value: impl Into<Operand>) -> Self {
        Condition::Lookup {
            field: field.into(),
            lookup,
            value: value.into(),
        }
    }

    /// Build a lookup from a `field__lookup` key, e.g. `"name__icontains"`.
    ///
    /// A key without `__` is an `exact` lookup.
    pub fn lookup_key(key: &str, value: impl Into<Operand>) -> QueryResult<Self> {
        let (field, lookup) = Lookup::split_key(key)?;
        Ok(Self::lookup(field, lookup, value))
    }

    /// Parse the JSON form of the where mini-language.
    ///
    /// - object: hash condition
    /// - array with an operator string first: `["and", c1, c2]`,
    ///   `["between", "age", 1, 10]`, `["in", "id", [1, 2]]`,
    ///   `["like", "name", "x", true]` (fourth element negates), `[">", "age", 5]`
    /// - string: raw condition
    pub fn from_json(json: &serde_json::Value) -> QueryResult<Self> {
        json::parse(json)
    }

    /// Parse the JSON mini-language from text.
    pub fn from_json_str(text: &str) -> QueryResult<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        json::parse(&json)
    }

    /// Check if this condition renders to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Hash(pairs) => pairs.is_empty(),
            Condition::And(items) | Condition::Or(items) => items.iter().all(Condition::is_empty),
            Condition::Not(inner) => inner.is_empty(),
            Condition::Raw { sql, .. } => sql.trim().is_empty(),
            Condition::Expr(e) => e.sql().trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::raw(sql)
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::raw(sql)
    }
}

impl From<Expression> for Condition {
    fn from(expression: Expression) -> Self {
        Condition::Expr(expression)
    }
}
