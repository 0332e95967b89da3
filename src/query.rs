//! # Query Representation
//!
//! The generic query object handed to the find layer. A query is an
//! ordered map of parameter keys (`conditions`, `limit`, `order`, `group`,
//! `joins`, ...) to JSON values; a scope fragment has the same shape.

use crate::error::ScopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-supplied find parameters
pub type Query = serde_json::Map<String, serde_json::Value>;

/// Partial query a named scope expands to
pub type ScopeFragment = serde_json::Map<String, serde_json::Value>;

/// Shape of find requested from the execution primitive
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FindType {
    All,
    #[default]
    First,
    Count,
    List,
    Neighbors,
    Threaded,
    Custom(String),
}

impl FindType {
    pub fn as_str(&self) -> &str {
        match self {
            FindType::All => "all",
            FindType::First => "first",
            FindType::Count => "count",
            FindType::List => "list",
            FindType::Neighbors => "neighbors",
            FindType::Threaded => "threaded",
            FindType::Custom(name) => name,
        }
    }

    pub fn is_count(&self) -> bool {
        matches!(self, FindType::Count)
    }
}

impl fmt::Display for FindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FindType::All),
            "first" => Ok(FindType::First),
            "count" => Ok(FindType::Count),
            "list" => Ok(FindType::List),
            "neighbors" => Ok(FindType::Neighbors),
            "threaded" => Ok(FindType::Threaded),
            "" => Err(ScopeError::InvalidFindType("empty find type".to_string())),
            other if other.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                Ok(FindType::Custom(other.to_string()))
            }
            other => Err(ScopeError::InvalidFindType(other.to_string())),
        }
    }
}

impl TryFrom<String> for FindType {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FindType> for String {
    fn from(find_type: FindType) -> Self {
        find_type.as_str().to_string()
    }
}

/// Build a [`Query`] from a JSON object literal; non-objects yield an empty query
pub fn query_from_value(value: serde_json::Value) -> Query {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Query::new(),
    }
}
