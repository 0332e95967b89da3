//! User fixture shared by unit tests, integration tests and benches.
//!
//! Five users; ids 1 and 2 are active, ids 3 to 5 are not.

use super::memory_store::{MemoryStore, Row};
use serde_json::{json, Value};

pub const USER_ALIAS: &str = "User";

pub fn user_rows() -> Vec<Row> {
    [
        (1, "alice", true, "2008-03-18 10:39:23"),
        (2, "bob", true, "2008-03-18 10:41:23"),
        (3, "carol", false, "2008-03-18 10:43:23"),
        (4, "dave", false, "2008-03-18 10:45:23"),
        (5, "erin", false, "2008-03-18 10:47:23"),
    ]
    .into_iter()
    .filter_map(|(id, name, is_active, created)| {
        json!({
            "id": id,
            "name": name,
            "is_active": is_active,
            "created": created
        })
        .as_object()
        .cloned()
    })
    .collect()
}

pub fn user_store() -> MemoryStore {
    MemoryStore::new(USER_ALIAS, user_rows())
}

/// Ids of the rows in an `all`-style result set
pub fn result_ids(results: &Value, alias: &str) -> Vec<i64> {
    results
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get(alias)?.get("id")?.as_i64())
                .collect()
        })
        .unwrap_or_default()
}
