#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Named Scope
//!
//! Named, reusable query scopes for an ORM find layer.
//!
//! ## Overview
//!
//! A model declares scopes such as `active` or `recent`, each expanding to a
//! fragment of find parameters. Callers select scopes either by naming them
//! in the query (`{"namedScope": ["active", "recent"]}`) or by calling a
//! composed finder name (`findActiveAndRecent`). Fragments are merged into the
//! caller's query with the caller's values taking precedence, and the merged
//! query is handed to the data-access layer's find primitive.
//!
//! ## Module Organization
//!
//! - [`scopes`] - registry, merger, resolver and find hooks
//! - [`model`] - model object owning scopes, flags and the find primitive
//! - [`query`] - query and fragment representation, find types
//! - [`config`] - behavior settings and scope declarations
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup and structured log helpers
//! - [`test_helpers`] - in-memory find primitive over fixture rows
//!
//! ## Quick Start
//!
//! ```rust
//! use named_scope::config::ScopeConfiguration;
//! use named_scope::model::ScopedModel;
//! use named_scope::query::{query_from_value, FindType};
//! use named_scope::test_helpers::{result_ids, user_store};
//! use serde_json::json;
//!
//! let scopes = ScopeConfiguration::from_value(json!({
//!     "active": {"conditions": {"is_active": true}},
//!     "limit": {"limit": 1}
//! }))?;
//! let users = ScopedModel::new("User", scopes, user_store());
//!
//! let found = users.find(FindType::All, query_from_value(json!({"namedScope": "active"})))?;
//! assert_eq!(result_ids(&found, "User"), vec![1, 2]);
//!
//! let found = users
//!     .call("findActiveAndLimit", Some(FindType::All), Default::default())?
//!     .into_results()
//!     .unwrap_or_default();
//! assert_eq!(result_ids(&found, "User"), vec![1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Threading
//!
//! Each find runs synchronously on the calling thread. A model keeps one set
//! of runtime flags between its before-find and after-find hooks, so a model
//! instance serves one find at a time.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod scopes;
pub mod test_helpers;

pub use config::{ScopeConfiguration, ScopeSettings};
pub use constants::{DEFAULT_SCOPE_KEY, FIND_PREFIX, SCOPE_SEPARATOR};
pub use error::{Result, ScopeError};
pub use model::{FindExecutor, MethodHook, ScopedModel};
pub use query::{query_from_value, FindType, Query, ScopeFragment};
pub use scopes::{
    apply_scopes, merge, resolve_dynamic_find, BeforeFind, DynamicFind, DynamicResolution,
    NamedScope, RuntimeFlags, ScopeHost, ScopeRegistry,
};
