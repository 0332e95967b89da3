//! # Scope Resolver
//!
//! Turns a request into an ordered list of scope names, either from the
//! reserved selector key inside a query or from a composed finder name such
//! as `findActiveAndLimit`.

use super::registry::ScopeRegistry;
use crate::constants::{FIND_PREFIX, SCOPE_SEPARATOR};
use crate::error::Result;
use crate::query::Query;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Outcome of parsing a composed finder name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicResolution {
    /// Scope names in the order they appear in the finder name, lower-cased
    Scopes(Vec<String>),
    /// The name is not a chain of registered scopes
    NotRecognized,
}

impl DynamicResolution {
    pub fn is_recognized(&self) -> bool {
        matches!(self, DynamicResolution::Scopes(_))
    }
}

/// Compiled alternation over the registered scope names.
///
/// Names are tried in descending order so that `activeuser` wins over its
/// prefix `active`. Names match case-insensitively; the `And` separator is
/// case-sensitive.
#[derive(Debug)]
pub struct ScopeChainMatcher {
    pattern: Option<Regex>,
}

impl ScopeChainMatcher {
    pub fn new(names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(Self { pattern: None });
        }

        let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let alternation = sorted
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(
            "((?i:{alternation}))({})?",
            regex::escape(SCOPE_SEPARATOR)
        ))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Split a scope chain token (`ActiveAndLimit`) into scope names.
    ///
    /// Succeeds only when the matches cover the whole token and every name
    /// but the last is followed by exactly one separator.
    pub fn resolve(&self, chain: &str) -> DynamicResolution {
        let Some(pattern) = &self.pattern else {
            return DynamicResolution::NotRecognized;
        };

        let mut tokens: Vec<(String, bool)> = Vec::new();
        let mut consumed = String::with_capacity(chain.len());

        for captures in pattern.captures_iter(chain) {
            if let Some(whole) = captures.get(0) {
                consumed.push_str(whole.as_str());
            }
            if let Some(name) = captures.get(1) {
                tokens.push((name.as_str().to_lowercase(), captures.get(2).is_some()));
            }
        }

        let Some(last) = tokens.len().checked_sub(1) else {
            return DynamicResolution::NotRecognized;
        };
        let well_formed = tokens
            .iter()
            .enumerate()
            .all(|(index, (_, separated))| *separated == (index != last));
        if consumed != chain || !well_formed {
            return DynamicResolution::NotRecognized;
        }
        DynamicResolution::Scopes(tokens.into_iter().map(|(name, _)| name).collect())
    }
}

/// Resolve a composed finder name against the registry's current scopes
pub fn resolve_dynamic_find(registry: &ScopeRegistry, method_name: &str) -> DynamicResolution {
    let Some(chain) = method_name.strip_prefix(FIND_PREFIX) else {
        return DynamicResolution::NotRecognized;
    };
    if chain.is_empty() {
        return DynamicResolution::NotRecognized;
    }

    let matcher = match registry.matcher() {
        Ok(matcher) => matcher,
        Err(err) => {
            warn!(method = %method_name, error = %err, "Scope chain matcher unavailable");
            return DynamicResolution::NotRecognized;
        }
    };

    let resolution = matcher.resolve(chain);
    debug!(method = %method_name, ?resolution, "Resolved dynamic finder name");
    resolution
}

/// Remove the selector key from `query` and return the names it carried.
///
/// `None` when the key is absent. A single name, a list of names or an
/// indexed map of names are accepted; other values select nothing.
pub fn take_declared_scopes(query: &mut Query, scope_key: &str) -> Option<Vec<String>> {
    let value = query.remove(scope_key)?;
    let names = match value {
        Value::String(name) => vec![name],
        Value::Array(items) => items.into_iter().filter_map(into_name).collect(),
        Value::Object(map) => map.into_iter().filter_map(|(_, v)| into_name(v)).collect(),
        _ => Vec::new(),
    };
    Some(
        names
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| name.to_lowercase())
            .collect(),
    )
}

fn into_name(value: Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name),
        _ => None,
    }
}

/// Drop repeated names, keeping the first occurrence of each
pub fn dedup_scope_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}
