use proptest::prelude::*;
use proptest::strategy::Just;
use serde_json::Value;

/// Strategy for generating query parameter keys
pub fn param_key_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

/// Strategy for generating scope names
pub fn scope_name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,10}"
}

/// Strategy for generating arbitrary scalar parameter values
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Strategy for generating scalars a caller is considered to have set
pub fn non_empty_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (1i64..1000).prop_map(Value::from),
        "[a-z]{1,8}".prop_map(Value::from),
        Just(Value::Bool(true)),
    ]
}

/// Strategy for generating absent or empty caller scalars
pub fn empty_scalar_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        Just(Some(Value::from(0))),
        Just(Some(Value::from(""))),
        Just(Some(Value::from("0"))),
        Just(Some(Value::Bool(false))),
    ]
}

/// Upper-case the first letter, as in a composed finder name
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
