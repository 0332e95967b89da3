//! # Named Scope Constants
//!
//! Reserved query keys and tokens shared by the registry, merger and
//! resolver.

/// Default reserved query key carrying one or more requested scope names
pub const DEFAULT_SCOPE_KEY: &str = "namedScope";

/// Literal prefix of dynamically composed finder names (`findActiveAndLimit`)
pub const FIND_PREFIX: &str = "find";

/// Separator between scope names in a composed finder name
pub const SCOPE_SEPARATOR: &str = "And";

/// Environment variable prefix for [`crate::config::ScopeSettings`] overrides
pub const ENV_PREFIX: &str = "NAMED_SCOPE";

/// Query parameter keys with meaning to the engine or the find layer
pub mod query_keys {
    pub const CONDITIONS: &str = "conditions";
    pub const FIELDS: &str = "fields";
    pub const GROUP: &str = "group";
    pub const JOINS: &str = "joins";
    pub const LIMIT: &str = "limit";
    pub const OFFSET: &str = "offset";
    pub const ORDER: &str = "order";
}

/// Key of the aggregate slot patched after a grouped count
pub const COUNT_KEY: &str = "count";

/// Top-level key under which declared scopes live in a configuration file
pub const SCOPES_CONFIG_KEY: &str = "scopes";
