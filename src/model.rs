//! # Scoped Model
//!
//! A model object that owns its scope registry, behavior settings, runtime
//! flags and the find-execution primitive, and routes finder names.
//!
//! ## Concurrency
//!
//! Runtime flags are stored per model and carried from the before-find hook
//! to the after-find hook of the same find. Running finds concurrently on one
//! model instance races on those flags; callers run one find at a time per
//! model.

use crate::config::{ScopeConfiguration, ScopeSettings};
use crate::constants::FIND_PREFIX;
use crate::error::Result;
use crate::logging::log_scope_operation;
use crate::query::{FindType, Query};
use crate::scopes::{
    BeforeFind, DynamicFind, NamedScope, RuntimeFlags, ScopeHost, ScopeRegistry,
};
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// The data-access layer's find primitive
pub trait FindExecutor {
    type Error;

    /// Execute a fully merged query
    fn execute_find(
        &self,
        find_type: &FindType,
        query: &Query,
    ) -> std::result::Result<Value, Self::Error>;

    /// Rows touched by the most recently executed aggregate query
    fn rows_affected(&self) -> u64;
}

/// Handler invoked for finder names matching a registered pattern
pub type MethodHook<E> = Box<
    dyn Fn(
            &ScopedModel<E>,
            &str,
            Option<FindType>,
            Query,
        ) -> std::result::Result<DynamicFind, <E as FindExecutor>::Error>
        + Send
        + Sync,
>;

struct MethodRoute<E: FindExecutor> {
    pattern: Regex,
    hook: MethodHook<E>,
}

/// A model with named scopes
pub struct ScopedModel<E: FindExecutor> {
    alias: String,
    registry: ScopeRegistry,
    settings: ScopeSettings,
    flags: Mutex<RuntimeFlags>,
    routes: Vec<MethodRoute<E>>,
    executor: E,
}

impl<E: FindExecutor> ScopedModel<E> {
    /// Create a model with default settings
    pub fn new(alias: impl Into<String>, configuration: ScopeConfiguration, executor: E) -> Self {
        Self::with_settings(alias, configuration, ScopeSettings::default(), executor)
    }

    pub fn with_settings(
        alias: impl Into<String>,
        configuration: ScopeConfiguration,
        settings: ScopeSettings,
        executor: E,
    ) -> Self {
        Self {
            alias: alias.into(),
            registry: ScopeRegistry::from_configuration(configuration),
            settings,
            flags: Mutex::new(RuntimeFlags::default()),
            routes: Vec::new(),
            executor,
        }
    }

    /// Route finder names matching `pattern` to `hook`.
    ///
    /// Hooks are tried in registration order after the scoped finder, so a
    /// hook only sees names the scoped finder left unhandled.
    pub fn register_hook(&mut self, pattern: &str, hook: MethodHook<E>) -> Result<()> {
        let pattern = Regex::new(pattern)?;
        debug!(model = %self.alias, pattern = %pattern, "Registered finder hook");
        self.routes.push(MethodRoute { pattern, hook });
        Ok(())
    }

    /// Run a find through the scope hooks
    pub fn find(&self, find_type: FindType, query: Query) -> std::result::Result<Value, E::Error> {
        self.flags.lock().find_type = Some(find_type.clone());

        let query = match NamedScope::before_find(self, &query) {
            BeforeFind::Proceed => query,
            BeforeFind::Replace(merged) => merged,
        };
        self.execute(&find_type, &query)
    }

    fn execute(&self, find_type: &FindType, query: &Query) -> std::result::Result<Value, E::Error> {
        let results = self.executor.execute_find(find_type, query)?;
        Ok(NamedScope::after_find(self, results, true))
    }

    /// Dispatch a finder name: `find` itself, a scope chain such as
    /// `findActiveAndLimit`, or a name some registered hook handles
    pub fn call(
        &self,
        method_name: &str,
        find_type: Option<FindType>,
        query: Query,
    ) -> std::result::Result<DynamicFind, E::Error> {
        if method_name == FIND_PREFIX {
            let find_type = find_type.unwrap_or_else(|| self.settings.default_find_type.clone());
            return self.find(find_type, query).map(DynamicFind::Found);
        }

        if method_name.starts_with(FIND_PREFIX) {
            let outcome = NamedScope::find_via_method_name(
                self,
                method_name,
                find_type.clone(),
                query.clone(),
            )?;
            if !outcome.is_unhandled() {
                return Ok(outcome);
            }
        }

        for route in self.routes.iter().filter(|route| route.pattern.is_match(method_name)) {
            match (route.hook)(self, method_name, find_type.clone(), query.clone())? {
                DynamicFind::Unhandled => continue,
                found => return Ok(found),
            }
        }
        Ok(DynamicFind::Unhandled)
    }

    /// Replace the declared scopes; the next request sees the new table
    pub fn set_scopes(&self, configuration: ScopeConfiguration) {
        let count = configuration.len();
        self.registry.replace(configuration);
        log_scope_operation(
            "set_scopes",
            &self.alias,
            None,
            "replaced",
            Some(&format!("scopes={count}")),
        );
    }

    /// Declare additional scopes, replacing fragments of existing names
    pub fn add_scopes(&self, configuration: ScopeConfiguration) {
        self.registry.register(configuration);
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn runtime_flags(&self) -> RuntimeFlags {
        self.flags.lock().clone()
    }
}

impl<E: FindExecutor> ScopeHost for ScopedModel<E> {
    type Error = E::Error;

    fn alias(&self) -> &str {
        &self.alias
    }

    fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    fn rows_affected(&self) -> u64 {
        self.executor.rows_affected()
    }

    fn set_has_group(&self, has_group: bool) {
        self.flags.lock().has_group = has_group;
    }

    fn take_has_group(&self) -> bool {
        std::mem::take(&mut self.flags.lock().has_group)
    }

    fn current_find_type(&self) -> Option<FindType> {
        self.flags.lock().find_type.clone()
    }

    fn find_scoped(
        &self,
        find_type: FindType,
        query: Query,
    ) -> std::result::Result<Value, Self::Error> {
        self.flags.lock().find_type = Some(find_type.clone());
        NamedScope::mark_scoped_query(self, &query);
        self.execute(&find_type, &query)
    }
}

impl<E: FindExecutor + fmt::Debug> fmt::Debug for ScopedModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedModel")
            .field("alias", &self.alias)
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("routes", &self.routes.len())
            .field("executor", &self.executor)
            .finish()
    }
}
