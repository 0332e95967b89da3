// Test Helpers Module - In-Memory Find Infrastructure
//
// Provides a fixture-backed find primitive so scope resolution can be
// exercised end to end without a database.

pub mod fixtures;
pub mod memory_store;

pub use fixtures::{result_ids, user_rows, user_store, USER_ALIAS};
pub use memory_store::{MemoryStore, MemoryStoreError, Row};
