//! # Named Scopes
//!
//! Named, reusable sets of find parameters ("scopes") declared per model and
//! applied either declaratively or through composed finder names.
//!
//! ## Components
//!
//! - [`registry`]: case-insensitive table of scope name to query fragment
//! - [`merge`]: folds fragments into caller queries, caller values first
//! - [`resolver`]: reads scope names from the selector key or a finder name
//! - [`behavior`]: before/after find hooks and the dynamic finder
//!
//! ## Usage Patterns
//!
//! ### Declarative selection
//! ```rust,ignore
//! let users = model.find(FindType::All, query_from_value(json!({
//!     "namedScope": ["active", "recent"],
//!     "limit": 10
//! })))?;
//! ```
//!
//! ### Composed finder names
//! ```rust,ignore
//! // Same as selecting ["active", "recent"]; unknown chains yield Unhandled
//! let outcome = model.call("findActiveAndRecent", Some(FindType::All), Query::new())?;
//! ```

pub mod behavior;
pub mod merge;
pub mod registry;
pub mod resolver;

pub use behavior::{BeforeFind, DynamicFind, NamedScope, RuntimeFlags, ScopeHost};
pub use merge::{apply_scopes, merge};
pub use registry::ScopeRegistry;
pub use resolver::{resolve_dynamic_find, DynamicResolution, ScopeChainMatcher};
