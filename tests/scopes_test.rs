//! End-to-end scope resolution against the five-user fixture.

use named_scope::config::ScopeConfiguration;
use named_scope::model::ScopedModel;
use named_scope::query::{query_from_value, FindType, Query};
use named_scope::test_helpers::{result_ids, user_store, MemoryStore, MemoryStoreError};
use named_scope::{DynamicFind, ScopeSettings};
use serde_json::{json, Value};

fn users(scopes: Value) -> ScopedModel<MemoryStore> {
    let configuration = ScopeConfiguration::from_value(scopes).unwrap();
    ScopedModel::new("User", configuration, user_store())
}

fn found(outcome: DynamicFind) -> Value {
    match outcome {
        DynamicFind::Found(results) => results,
        DynamicFind::Unhandled => panic!("finder name was not handled"),
    }
}

#[test]
fn test_query_scoped() {
    let model = users(json!({"active": {"conditions": {"is_active": true}}}));
    let results = model
        .find(FindType::All, query_from_value(json!({"namedScope": "active"})))
        .unwrap();
    let ids = result_ids(&results, "User");
    assert!(ids.contains(&2));
    assert!(!ids.contains(&3));
    assert_eq!(ids, vec![1, 2]);

    model.set_scopes(
        ScopeConfiguration::from_value(json!({
            "active": {"conditions": {"is_active": false}, "limit": 2}
        }))
        .unwrap(),
    );
    let results = model
        .find(FindType::All, query_from_value(json!({"namedScope": "active"})))
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![3, 4]);
}

#[test]
fn test_query_scoped_overwrite() {
    let model = users(json!({"active": {"conditions": {"is_active": false}, "limit": 2}}));
    let results = model
        .find(
            FindType::All,
            query_from_value(json!({"namedScope": "active", "limit": 1})),
        )
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![3]);
}

#[test]
fn test_query_scoped_without_settings() {
    let model = users(json!(["active"]));
    let results = model
        .find(FindType::All, query_from_value(json!({"namedScope": "active"})))
        .unwrap();
    let ids = result_ids(&results, "User");
    assert!(ids.contains(&5));
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_query_scoped_with_unknown_scope() {
    let model = users(json!({"active": {"conditions": {"is_active": true}}}));
    let results = model
        .find(
            FindType::All,
            query_from_value(json!({"namedScope": ["missing", "ACTIVE"]})),
        )
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![1, 2]);
}

#[test]
fn test_method_scoped() {
    let model = users(json!({
        "active": {"conditions": {"is_active": true}},
        "limit": {"limit": 1}
    }));

    let results = found(model.call("findActive", Some(FindType::All), Query::new()).unwrap());
    assert_eq!(result_ids(&results, "User"), vec![1, 2]);

    let results = found(
        model
            .call("findActiveAndLimit", Some(FindType::All), Query::new())
            .unwrap(),
    );
    assert_eq!(result_ids(&results, "User"), vec![1]);
}

#[test]
fn test_method_scoped_overwrite() {
    let model = users(json!({
        "active": {"conditions": {"is_active": false}, "limit": 2}
    }));

    let results = found(
        model
            .call("findActive", Some(FindType::All), query_from_value(json!({"limit": 1})))
            .unwrap(),
    );
    assert_eq!(result_ids(&results, "User"), vec![3]);
}

#[test]
fn test_method_scoped_and_query_scoped() {
    let model = users(json!({
        "active": {"conditions": {"is_active": true}},
        "limit": {"limit": 1}
    }));

    let results = found(
        model
            .call(
                "findActive",
                Some(FindType::All),
                query_from_value(json!({"namedScope": "limit"})),
            )
            .unwrap(),
    );
    assert_eq!(result_ids(&results, "User"), vec![1]);

    // Same scope through both paths applies once
    let results = found(
        model
            .call(
                "findActiveAndLimit",
                Some(FindType::All),
                query_from_value(json!({"namedScope": "limit"})),
            )
            .unwrap(),
    );
    assert_eq!(result_ids(&results, "User"), vec![1]);
}

#[test]
fn test_method_scoped_defaults_to_first() {
    let model = users(json!({"inactive": {"conditions": {"is_active": false}}}));
    let results = found(model.call("findInactive", None, Query::new()).unwrap());
    assert_eq!(results["User"]["id"], json!(3));
}

#[test]
fn test_method_scoped_unknown_chain_is_unhandled() {
    let model = users(json!({
        "active": {"conditions": {"is_active": true}},
        "limit": {"limit": 1}
    }));
    for name in [
        "findRecent",
        "findActiveLimit",
        "findActiveAndLimitAnd",
        "findActiveLimitAnd",
        "FindActive",
    ] {
        let outcome = model.call(name, Some(FindType::All), Query::new()).unwrap();
        assert!(outcome.is_unhandled(), "{name} should be unhandled");
    }
}

#[test]
fn test_method_scoped_prefers_longest_name() {
    let model = users(json!({
        "active": {"conditions": {"is_active": true}},
        "activeuser": {"conditions": {"id": 2}}
    }));
    let results = found(
        model
            .call("findActiveuser", Some(FindType::All), Query::new())
            .unwrap(),
    );
    assert_eq!(result_ids(&results, "User"), vec![2]);
}

#[test]
fn test_scopes_compose_left_to_right() {
    let model = users(json!({
        "newest": {"order": "id DESC", "limit": 3},
        "limit": {"limit": 1}
    }));
    let results = found(
        model
            .call("findNewestAndLimit", Some(FindType::All), Query::new())
            .unwrap(),
    );
    // `newest` set the limit first, so `limit` finds it already present
    assert_eq!(result_ids(&results, "User"), vec![5, 4, 3]);
}

#[test]
fn test_caller_conditions_are_merged_not_replaced() {
    let model = users(json!({"active": {"conditions": {"is_active": true}}}));
    let results = model
        .find(
            FindType::All,
            query_from_value(json!({"namedScope": "active", "conditions": {"id >": 1}})),
        )
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![2]);
}

#[test]
fn test_grouped_count_is_patched_with_rows_affected() {
    let model = users(json!({
        "by_status": {"group": "is_active", "conditions": {"id >=": 2}}
    }));
    let results = model
        .find(
            FindType::Count,
            query_from_value(json!({"namedScope": "by_status"})),
        )
        .unwrap();
    // Groups hold 1 and 3 rows; the aggregate slot now carries the 2 groups
    assert_eq!(results[0]["0"]["count"], json!(2));
    assert_eq!(results[1]["0"]["count"], json!(3));

    let results = found(
        model
            .call("findBy_status", Some(FindType::Count), Query::new())
            .unwrap(),
    );
    assert_eq!(results[0]["0"]["count"], json!(2));
}

#[test]
fn test_unscoped_grouped_count_is_untouched() {
    let model = users(json!({"active": {"conditions": {"is_active": true}}}));
    let results = model
        .find(
            FindType::Count,
            query_from_value(json!({"group": "is_active", "conditions": {"id >=": 2}})),
        )
        .unwrap();
    assert_eq!(results, json!([{"0": {"count": 1}}, {"0": {"count": 3}}]));
}

#[test]
fn test_grouped_find_all_is_untouched() {
    let model = users(json!({
        "by_status": {"group": "is_active", "conditions": {"id >=": 2}}
    }));
    let results = model
        .find(FindType::All, query_from_value(json!({"namedScope": "by_status"})))
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![2, 3, 4, 5]);
}

#[test]
fn test_ungrouped_count_is_untouched() {
    let model = users(json!({"active": {"conditions": {"is_active": true}}}));
    let results = model
        .find(FindType::Count, query_from_value(json!({"namedScope": "active"})))
        .unwrap();
    assert_eq!(results, json!([{"0": {"count": 2}}]));
}

#[test]
fn test_grouped_count_fixup_can_be_disabled() {
    let configuration = ScopeConfiguration::from_value(json!({
        "by_status": {"group": "is_active", "conditions": {"id >=": 2}}
    }))
    .unwrap();
    let settings = ScopeSettings {
        fixup_grouped_counts: false,
        ..ScopeSettings::default()
    };
    let model = ScopedModel::with_settings("User", configuration, settings, user_store());
    let results = model
        .find(
            FindType::Count,
            query_from_value(json!({"namedScope": "by_status"})),
        )
        .unwrap();
    assert_eq!(results, json!([{"0": {"count": 1}}, {"0": {"count": 3}}]));
}

#[test]
fn test_custom_scope_key() {
    let configuration =
        ScopeConfiguration::from_value(json!({"active": {"conditions": {"is_active": true}}}))
            .unwrap();
    let settings = ScopeSettings::default().with_scope_key("named");
    let model = ScopedModel::with_settings("User", configuration, settings, user_store());

    let results = model
        .find(FindType::All, query_from_value(json!({"named": "active"})))
        .unwrap();
    assert_eq!(result_ids(&results, "User"), vec![1, 2]);
}

#[test]
fn test_executor_errors_propagate_unchanged() {
    let model = users(json!({"broken": {"conditions": "is_active = 1"}}));
    let err = model
        .find(FindType::All, query_from_value(json!({"namedScope": "broken"})))
        .unwrap_err();
    assert!(matches!(err, MemoryStoreError::InvalidParameter { .. }));

    let err = model
        .call("findBroken", Some(FindType::All), Query::new())
        .unwrap_err();
    assert!(matches!(err, MemoryStoreError::InvalidParameter { .. }));
}
