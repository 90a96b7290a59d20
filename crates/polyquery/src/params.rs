//! Named parameter storage.
//!
//! Parameters are kept in insertion order so that positional drivers can bind
//! them in the order the builder visited them.

use crate::value::Value;
use indexmap::IndexMap;

/// An insertion-ordered map from placeholder name (`:name`) to value.
///
/// Names are normalized to carry a leading `:`; `insert("id", 1)` and
/// `insert(":id", 1)` address the same placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: IndexMap<String, Value>,
}

fn normalize(name: &str) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

impl Params {
    /// Create a new empty parameter map.
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Insert or replace a parameter. Returns the previous value, if any.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(normalize(name), value.into())
    }

    /// Chainable insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Placeholder names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Merge another map into this one. Entries from `other` win on conflict.
    pub fn extend(&mut self, other: &Params) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Consume the map, returning the underlying ordered map.
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k.as_ref(), v);
        }
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
