//! Error types for polyquery

use thiserror::Error;

/// Result type alias for polyquery operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unrecognized operator or wrong operand count in a condition
    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    /// A query feature the active dialect cannot express
    #[error("{feature} is not supported by the {dialect} dialect")]
    NotSupported {
        dialect: &'static str,
        feature: String,
    },

    /// An operator that exists in the vocabulary but has no translation
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Batch insert row whose width differs from the column list
    #[error("Batch insert row {row} has {actual} values, expected {expected}")]
    BatchInsertMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Lookup received a value it cannot translate
    #[error("Invalid value for lookup '{lookup}': {message}")]
    InvalidLookupValue { lookup: String, message: String },

    /// Statement shape rejected before any SQL was produced
    #[error("Validation error: {0}")]
    Validation(String),

    /// No connection registered under the given name
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Error reported by the connection while executing a statement
    #[error("Execution error: {0}")]
    Execution(String),

    /// Schema metadata could not be read or interpreted
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl QueryError {
    /// Create a malformed condition error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCondition(message.into())
    }

    /// Create a "not supported" error for a dialect
    pub fn not_supported(dialect: &'static str, feature: impl Into<String>) -> Self {
        Self::NotSupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Create an invalid lookup value error
    pub fn invalid_lookup(lookup: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLookupValue {
            lookup: lookup.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this is a "not supported" error
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }

    /// Check if this is a "not implemented" error
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }

    /// Check if this is a malformed condition error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedCondition(_))
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedCondition(err.to_string())
    }
}

impl From<toml::de::Error> for QueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
