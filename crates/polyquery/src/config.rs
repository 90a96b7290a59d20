//! TOML connection configuration.
//!
//! ```toml
//! default = "main"
//!
//! [connections.main]
//! dsn = "mysql:host=localhost;dbname=app"
//! table_prefix = "tbl_"
//!
//! [connections.report]
//! dsn = "postgres://report@${REPORT_HOST}/warehouse"
//! inline_values = true
//! ```
//!
//! `${VAR}` references in string fields are expanded from the environment
//! by [`DatabaseConfig::load`] and [`DatabaseConfig::from_toml_str`].

use crate::dialect::DialectKind;
use crate::error::{QueryError, QueryResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

fn default_connection_name() -> String {
    "db".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Name of the connection used when none is given.
    #[serde(default = "default_connection_name")]
    pub default: String,

    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// PDO-style (`mysql:host=...`) or URL-style (`postgres://...`) DSN.
    pub dsn: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub table_prefix: String,

    /// Render values as literals instead of binding them.
    #[serde(default)]
    pub inline_values: bool,
}

impl ConnectionConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            username: None,
            password: None,
            table_prefix: String::new(),
            inline_values: false,
        }
    }

    /// Dialect named by the DSN scheme.
    pub fn dialect(&self) -> QueryResult<DialectKind> {
        let scheme = self
            .dsn
            .split_once(':')
            .map(|(scheme, _)| scheme.trim())
            .unwrap_or_default();
        DialectKind::from_driver(scheme).ok_or_else(|| {
            QueryError::Config(format!("cannot derive a dialect from DSN '{}'", self.dsn))
        })
    }

    fn expand_env(&mut self) -> QueryResult<()> {
        self.dsn = expand_env_vars(&self.dsn)?;
        if let Some(user) = self.username.as_mut() {
            *user = expand_env_vars(user)?;
        }
        if let Some(password) = self.password.as_mut() {
            *password = expand_env_vars(password)?;
        }
        self.table_prefix = expand_env_vars(&self.table_prefix)?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Parse, expand and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> QueryResult<Self> {
        let mut config: DatabaseConfig = toml::from_str(raw)?;
        for conn in config.connections.values_mut() {
            conn.expand_env()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn connection(&self, name: &str) -> QueryResult<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| QueryError::UnknownConnection(name.to_string()))
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.connections.is_empty() {
            return Err(QueryError::Config(
                "at least one [connections.<name>] entry is required".to_string(),
            ));
        }
        if !self.connections.contains_key(&self.default) {
            return Err(QueryError::Config(format!(
                "default connection '{}' is not configured",
                self.default
            )));
        }
        for (name, conn) in &self.connections {
            if conn.dsn.trim().is_empty() {
                return Err(QueryError::Config(format!(
                    "connections.{name}.dsn must not be empty"
                )));
            }
            conn.dialect()?;
        }
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> QueryResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(QueryError::Config(format!(
                    "unterminated env var reference: ${{{key}"
                )));
            }
            if key.is_empty() {
                return Err(QueryError::Config(
                    "invalid env var reference: ${}".to_string(),
                ));
            }

            let v = std::env::var(&key).map_err(|_| {
                QueryError::Config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
