//! # Scope Registry
//!
//! Per-model table of scope name to query fragment. The table can be
//! replaced at runtime, so every request reads it fresh; nothing outside the
//! registry holds a snapshot across requests. The compiled finder-name
//! matcher is cached against a generation counter and rebuilt on the first
//! request after a change.

use super::resolver::ScopeChainMatcher;
use crate::config::ScopeConfiguration;
use crate::error::Result;
use crate::query::ScopeFragment;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct RegistryState {
    scopes: BTreeMap<String, ScopeFragment>,
    generation: u64,
}

/// Named scopes declared for one model
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    state: RwLock<RegistryState>,
    matcher: Mutex<Option<(u64, Arc<ScopeChainMatcher>)>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_configuration(configuration: ScopeConfiguration) -> Self {
        let registry = Self::new();
        registry.register(configuration);
        registry
    }

    /// Add the declared scopes, replacing fragments of names already present
    pub fn register(&self, configuration: ScopeConfiguration) {
        let mut state = self.state.write();
        for (name, fragment) in configuration.into_entries() {
            debug!(scope = %name, keys = fragment.len(), "Registering named scope");
            state.scopes.insert(name, fragment);
        }
        state.generation += 1;
    }

    /// Swap the whole table for a new configuration
    pub fn replace(&self, configuration: ScopeConfiguration) {
        let mut state = self.state.write();
        state.scopes = configuration.into_entries().into_iter().collect();
        state.generation += 1;
        info!(
            scopes = state.scopes.len(),
            generation = state.generation,
            "Replaced named scope registry"
        );
    }

    /// Fragment registered under `name`, compared case-insensitively.
    ///
    /// Absent names and empty fragments both yield `None`.
    pub fn lookup(&self, name: &str) -> Option<ScopeFragment> {
        let state = self.state.read();
        state
            .scopes
            .get(&name.to_lowercase())
            .filter(|fragment| !fragment.is_empty())
            .cloned()
    }

    /// Whether `name` is declared, including bare scopes
    pub fn contains(&self, name: &str) -> bool {
        self.state.read().scopes.contains_key(&name.to_lowercase())
    }

    /// Registered names in ascending order
    pub fn names(&self) -> Vec<String> {
        self.state.read().scopes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().scopes.is_empty()
    }

    /// Incremented on every change to the table
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Finder-name matcher for the current table, rebuilt after any change
    pub fn matcher(&self) -> Result<Arc<ScopeChainMatcher>> {
        let (generation, names) = {
            let state = self.state.read();
            (state.generation, state.scopes.keys().cloned().collect::<Vec<_>>())
        };

        let mut cached = self.matcher.lock();
        if let Some((built_for, matcher)) = cached.as_ref() {
            if *built_for == generation {
                return Ok(Arc::clone(matcher));
            }
        }

        let matcher = Arc::new(ScopeChainMatcher::new(&names)?);
        debug!(generation, scopes = names.len(), "Rebuilt scope chain matcher");
        *cached = Some((generation, Arc::clone(&matcher)));
        Ok(matcher)
    }
}
