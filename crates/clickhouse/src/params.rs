//! Positional SQL parameters.
//!
//! Every variable value in a store query travels through one of these
//! variants onto a `?` placeholder. Identifiers never do; those pass the
//! compiler's allowlists and are emitted as static SQL fragments.

use clickhouse::query::Query;

/// A value bound to a positional `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
}

impl SqlParam {
    /// Bind this parameter onto the next placeholder of `query`.
    pub fn bind_to(&self, query: Query) -> Query {
        match self {
            Self::Text(v) => query.bind(v.as_str()),
            Self::Int(v) => query.bind(*v),
            Self::Float(v) => query.bind(*v),
        }
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
