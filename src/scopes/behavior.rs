//! # Named Scope Behavior
//!
//! The hooks a model runs around its find primitive:
//!
//! - [`NamedScope::before_find`] merges scopes named under the selector key;
//! - [`NamedScope::after_find`] patches grouped count results;
//! - [`NamedScope::find_via_method_name`] serves composed finder names.
//!
//! The host model supplies state through [`ScopeHost`]. Runtime flags live on
//! the host and are only meaningful between the before and after hooks of one
//! find, so a host must not run finds concurrently.

use super::merge::{apply_scopes, is_empty_value};
use super::registry::ScopeRegistry;
use super::resolver::{
    dedup_scope_names, resolve_dynamic_find, take_declared_scopes, DynamicResolution,
};
use crate::config::ScopeSettings;
use crate::constants::{query_keys, COUNT_KEY};
use crate::logging::log_scope_operation;
use crate::query::{FindType, Query};
use serde_json::Value;
use tracing::{debug, warn};

/// Per-model state carried from before-find to after-find
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeFlags {
    /// The in-progress query carries a `group` clause
    pub has_group: bool,
    /// Find type of the in-progress find
    pub find_type: Option<FindType>,
}

/// Result of the before-find hook
#[derive(Debug, Clone, PartialEq)]
pub enum BeforeFind {
    /// No scope was requested; run the query as given
    Proceed,
    /// Run this merged query instead
    Replace(Query),
}

/// Result of routing a finder name
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicFind {
    /// The name was handled and the find ran
    Found(Value),
    /// The name does not correspond to a known scope combination
    Unhandled,
}

impl DynamicFind {
    pub fn is_unhandled(&self) -> bool {
        matches!(self, DynamicFind::Unhandled)
    }

    pub fn into_results(self) -> Option<Value> {
        match self {
            DynamicFind::Found(results) => Some(results),
            DynamicFind::Unhandled => None,
        }
    }
}

/// Model-side collaborators the scope hooks rely on
pub trait ScopeHost {
    type Error;

    /// Alias used as the row key in result sets
    fn alias(&self) -> &str;
    fn registry(&self) -> &ScopeRegistry;
    fn settings(&self) -> &ScopeSettings;
    /// Rows touched by the most recent aggregate query
    fn rows_affected(&self) -> u64;
    fn set_has_group(&self, has_group: bool);
    /// Read and clear the group flag of the in-progress find
    fn take_has_group(&self) -> bool;
    fn current_find_type(&self) -> Option<FindType>;
    /// Run a query whose scopes are already merged: execution and
    /// after-find, skipping the selector key lookup
    fn find_scoped(&self, find_type: FindType, query: Query) -> Result<Value, Self::Error>;
}

/// Named scope hooks
pub struct NamedScope;

impl NamedScope {
    /// Merge the scopes named under the selector key into `query`
    pub fn before_find<H: ScopeHost>(host: &H, query: &Query) -> BeforeFind {
        let mut scoped = query.clone();
        let Some(names) = take_declared_scopes(&mut scoped, &host.settings().scope_key) else {
            host.set_has_group(false);
            return BeforeFind::Proceed;
        };

        debug!(model = %host.alias(), scopes = ?names, "Applying declared named scopes");
        let merged = apply_scopes(host.registry(), scoped, &dedup_scope_names(names));
        Self::mark_scoped_query(host, &merged);
        BeforeFind::Replace(merged)
    }

    /// Record whether a scope-merged query groups, for the after-find hook
    pub fn mark_scoped_query<H: ScopeHost>(host: &H, merged: &Query) {
        host.set_has_group(has_group_clause(merged));
    }

    /// Replace the aggregate slot of a grouped count with the affected row count.
    ///
    /// Only primary count finds whose scope-merged query carried `group` are
    /// touched; unscoped finds pass through. Two
    /// result shapes are tried, `results[0][0].count` then
    /// `results[0][alias].count`; anything else passes through.
    pub fn after_find<H: ScopeHost>(host: &H, mut results: Value, primary: bool) -> Value {
        let has_group = host.take_has_group();
        let is_count = host
            .current_find_type()
            .is_some_and(|find_type| find_type.is_count());

        if !primary || !has_group || !is_count || !host.settings().fixup_grouped_counts {
            return results;
        }

        let rows = host.rows_affected();
        if patch_count_slot(&mut results, host.alias(), rows) {
            log_scope_operation(
                "grouped_count_fixup",
                host.alias(),
                None,
                "patched",
                Some(&format!("count={rows}")),
            );
        } else {
            warn!(model = %host.alias(), "Grouped count result has no known count slot");
        }
        results
    }

    /// Serve a composed finder name such as `findActiveAndLimit`.
    ///
    /// Declared scopes in `query` are appended after the name-derived ones.
    /// Returns [`DynamicFind::Unhandled`] when the name is not a clean chain of
    /// registered scopes; execution errors propagate unchanged.
    pub fn find_via_method_name<H: ScopeHost>(
        host: &H,
        method_name: &str,
        find_type: Option<FindType>,
        mut query: Query,
    ) -> Result<DynamicFind, H::Error> {
        let mut names = match resolve_dynamic_find(host.registry(), method_name) {
            DynamicResolution::Scopes(names) => names,
            DynamicResolution::NotRecognized => {
                debug!(
                    model = %host.alias(),
                    method = %method_name,
                    "Finder name not handled by named scopes"
                );
                return Ok(DynamicFind::Unhandled);
            }
        };

        if let Some(declared) = take_declared_scopes(&mut query, &host.settings().scope_key) {
            names.extend(declared);
        }

        let names = dedup_scope_names(names);
        if names.is_empty() {
            return Ok(DynamicFind::Unhandled);
        }

        let query = apply_scopes(host.registry(), query, &names);
        let find_type = find_type.unwrap_or_else(|| host.settings().default_find_type.clone());
        debug!(
            model = %host.alias(),
            method = %method_name,
            scopes = ?names,
            find_type = %find_type,
            "Dispatching scoped finder"
        );

        host.find_scoped(find_type, query).map(DynamicFind::Found)
    }
}

fn has_group_clause(query: &Query) -> bool {
    query
        .get(query_keys::GROUP)
        .is_some_and(|group| !is_empty_value(group))
}

fn patch_count_slot(results: &mut Value, alias: &str, rows: u64) -> bool {
    let Some(row) = child_mut(results, "0") else {
        return false;
    };

    for slot in ["0", alias] {
        let present = child(row, slot)
            .and_then(|aggregate| aggregate.get(COUNT_KEY))
            .is_some();
        if present {
            if let Some(count) =
                child_mut(row, slot).and_then(|aggregate| aggregate.get_mut(COUNT_KEY))
            {
                *count = Value::from(rows);
                return true;
            }
        }
    }
    false
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) => items.get_mut(index),
            Err(_) => None,
        },
        _ => None,
    }
}
