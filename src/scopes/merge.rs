//! # Scope Merger
//!
//! Folds a scope fragment into a caller query. Caller values always win:
//!
//! - scalar fragment values only fill keys that are absent or empty in the
//!   query;
//! - structured fragment values are copied in when the key is absent and
//!   deep-merged otherwise. A list-like query value (an array, or an object
//!   keyed `"0"`, `"1"`, ... in order) gets the fragment's items appended;
//!   any other value is merged key by key, recursively, keeping the query's
//!   scalars on collision.

use super::registry::ScopeRegistry;
use crate::query::{Query, ScopeFragment};
use serde_json::{Map, Value};
use tracing::debug;

/// Merge one fragment into `query`
pub fn merge(mut query: Query, fragment: &ScopeFragment) -> Query {
    for (key, value) in fragment {
        if is_structured(value) {
            match query.get_mut(key) {
                Some(existing) if !existing.is_null() => {
                    let current = existing.take();
                    *existing = merge_structured(current, value);
                }
                _ => {
                    query.insert(key.clone(), value.clone());
                }
            }
        } else if query.get(key).map_or(true, is_empty_value) {
            query.insert(key.clone(), value.clone());
        }
    }
    query
}

/// Merge the fragments of `names` into `query`, left to right.
///
/// Names that are unknown or declared without a fragment are skipped.
pub fn apply_scopes<S: AsRef<str>>(registry: &ScopeRegistry, query: Query, names: &[S]) -> Query {
    names.iter().fold(query, |query, name| {
        let name = name.as_ref();
        match registry.lookup(name) {
            Some(fragment) => {
                debug!(scope = %name, keys = fragment.len(), "Merging named scope");
                merge(query, &fragment)
            }
            None => {
                debug!(scope = %name, "Skipping unknown or empty named scope");
                query
            }
        }
    })
}

/// Deep-merge an incoming structured value into a present query value
pub fn merge_structured(existing: Value, incoming: &Value) -> Value {
    if is_list_like(&existing) || !is_structured(&existing) {
        concat(list_items(existing), incoming)
    } else {
        merge_maps(existing, incoming)
    }
}

fn concat(mut items: Vec<Value>, incoming: &Value) -> Value {
    if is_list_like(incoming) {
        items.extend(list_items(incoming.clone()));
        return Value::Array(items);
    }

    // Keyed entries cannot live in a JSON array; fall back to an indexed map.
    let mut merged: Map<String, Value> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| (index.to_string(), item))
        .collect();
    let mut next_index = merged.len();
    for (key, value) in entries(incoming) {
        if key.parse::<usize>().is_ok() {
            merged.insert(next_index.to_string(), value);
            next_index += 1;
        } else {
            merged.entry(key).or_insert(value);
        }
    }
    Value::Object(merged)
}

fn merge_maps(existing: Value, incoming: &Value) -> Value {
    let mut merged = match existing {
        Value::Object(map) => map,
        other => return other,
    };

    for (key, value) in entries(incoming) {
        match merged.get_mut(&key) {
            Some(current) if !current.is_null() => {
                if is_structured(&value) {
                    let taken = current.take();
                    *current = merge_structured(taken, &value);
                }
            }
            _ => {
                merged.insert(key, value);
            }
        }
    }
    Value::Object(merged)
}

fn entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    }
}

pub fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Arrays, and objects whose keys are exactly `"0"..="n-1"` in order
pub fn is_list_like(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) => map
            .keys()
            .enumerate()
            .all(|(index, key)| *key == index.to_string()),
        _ => false,
    }
}

/// Values a caller is treated as not having set
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::query_from_value;
    use serde_json::json;

    fn fragment(value: Value) -> ScopeFragment {
        query_from_value(value)
    }

    #[test]
    fn test_caller_scalar_wins() {
        let query = fragment(json!({"limit": 1}));
        let merged = merge(query, &fragment(json!({"limit": 2})));
        assert_eq!(merged["limit"], json!(1));
    }

    #[test]
    fn test_empty_caller_scalar_is_filled() {
        for empty in [json!(null), json!(0), json!(""), json!("0"), json!(false)] {
            let query = fragment(json!({"limit": empty}));
            let merged = merge(query, &fragment(json!({"limit": 2})));
            assert_eq!(merged["limit"], json!(2));
        }
    }

    #[test]
    fn test_structured_value_copied_when_absent() {
        let merged = merge(Query::new(), &fragment(json!({"conditions": {"is_active": true}})));
        assert_eq!(merged["conditions"], json!({"is_active": true}));
    }

    #[test]
    fn test_lists_concatenate_caller_first() {
        let query = fragment(json!({"fields": ["id", "name"]}));
        let merged = merge(query, &fragment(json!({"fields": ["name", "created"]})));
        assert_eq!(merged["fields"], json!(["id", "name", "name", "created"]));
    }

    #[test]
    fn test_indexed_object_counts_as_list() {
        let query = fragment(json!({"joins": {"0": "posts"}}));
        let merged = merge(query, &fragment(json!({"joins": ["comments"]})));
        assert_eq!(merged["joins"], json!(["posts", "comments"]));
    }

    #[test]
    fn test_maps_merge_recursively_caller_wins() {
        let query = fragment(json!({
            "conditions": {"is_active": false, "nested": {"a": 1}}
        }));
        let merged = merge(
            query,
            &fragment(json!({
                "conditions": {"is_active": true, "role": "admin", "nested": {"a": 9, "b": 2}}
            })),
        );
        assert_eq!(
            merged["conditions"],
            json!({"is_active": false, "nested": {"a": 1, "b": 2}, "role": "admin"})
        );
    }

    #[test]
    fn test_list_with_keyed_fragment_becomes_indexed_map() {
        let query = fragment(json!({"conditions": ["User.id > 2"]}));
        let merged = merge(query, &fragment(json!({"conditions": {"is_active": true}})));
        assert_eq!(
            merged["conditions"],
            json!({"0": "User.id > 2", "is_active": true})
        );
    }

    #[test]
    fn test_scalar_caller_value_joins_structured_fragment() {
        let query = fragment(json!({"order": "id DESC"}));
        let merged = merge(query, &fragment(json!({"order": ["created ASC"]})));
        assert_eq!(merged["order"], json!(["id DESC", "created ASC"]));
    }

    #[test]
    fn test_list_like_detection() {
        assert!(is_list_like(&json!([])));
        assert!(is_list_like(&json!({"0": "a", "1": "b"})));
        assert!(!is_list_like(&json!({"1": "a"})));
        assert!(!is_list_like(&json!({"0": "a", "name": "b"})));
        assert!(!is_list_like(&json!("a")));
    }

    #[test]
    fn test_apply_scopes_skips_unknown_names() {
        let registry = ScopeRegistry::from_configuration(
            crate::config::ScopeConfiguration::from_value(json!({"limit": {"limit": 1}})).unwrap(),
        );
        let query = fragment(json!({"order": "id"}));
        let merged = apply_scopes(&registry, query.clone(), &["missing"]);
        assert_eq!(merged, query);

        let merged = apply_scopes(&registry, query, &["missing", "LIMIT"]);
        assert_eq!(merged["limit"], json!(1));
    }
}
