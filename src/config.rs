//! # Scope Configuration
//!
//! Two kinds of configuration feed the engine:
//!
//! - [`ScopeSettings`]: behavior settings (reserved selector key, default
//!   find type for dynamic finders, grouped-count fixup switch), layered from
//!   defaults, an optional file and `NAMED_SCOPE_*` environment variables.
//! - [`ScopeConfiguration`]: the declared scopes of one model, normalized
//!   from either a `{name: fragment}` map or a list of bare names.

use crate::constants::{DEFAULT_SCOPE_KEY, ENV_PREFIX, SCOPES_CONFIG_KEY};
use crate::error::{Result, ScopeError};
use crate::query::{FindType, ScopeFragment};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Behavior settings shared by every model using named scopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    /// Reserved query key holding the requested scope name(s)
    pub scope_key: String,
    /// Find type used by dynamic finders when the caller passes none
    pub default_find_type: FindType,
    /// Patch the aggregate slot of grouped count results
    pub fixup_grouped_counts: bool,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            scope_key: DEFAULT_SCOPE_KEY.to_string(),
            default_find_type: FindType::First,
            fixup_grouped_counts: true,
        }
    }
}

impl ScopeSettings {
    /// Load settings from defaults, an optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("scope_key", defaults.scope_key)?
            .set_default("default_find_type", defaults.default_find_type.to_string())?
            .set_default("fixup_grouped_counts", defaults.fixup_grouped_counts)?;

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading scope settings file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Settings loaded from the environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scope_key.trim().is_empty() {
            return Err(ScopeError::ConfigurationError(
                "scope_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_scope_key(mut self, scope_key: impl Into<String>) -> Self {
        self.scope_key = scope_key.into();
        self
    }
}

/// Normalized scope declarations for a single model
///
/// Names are lower-cased here, at write time. Later declarations of the same
/// name replace earlier ones but keep the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeConfiguration {
    entries: Vec<(String, ScopeFragment)>,
}

impl ScopeConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one scope
    pub fn scope(mut self, name: &str, fragment: ScopeFragment) -> Self {
        self.insert(name, fragment);
        self
    }

    /// Add or replace a bare scope with an empty fragment
    pub fn bare(self, name: &str) -> Self {
        self.scope(name, ScopeFragment::new())
    }

    /// Normalize a declared configuration value.
    ///
    /// Accepts `{name: fragment}`, `[name, {name: fragment}, ...]`, a single
    /// name, or `null`. Non-object fragments normalize to `{}`.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut configuration = Self::new();
        match value {
            Value::Null => {}
            Value::String(name) => configuration.try_insert(&name, Value::Null)?,
            Value::Object(map) => {
                for (name, fragment) in map {
                    configuration.try_insert(&name, fragment)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(name) => configuration.try_insert(&name, Value::Null)?,
                        Value::Object(map) => {
                            for (name, fragment) in map {
                                configuration.try_insert(&name, fragment)?;
                            }
                        }
                        other => {
                            return Err(ScopeError::InvalidConfiguration(format!(
                                "scope list entries must be names or maps, got {other}"
                            )))
                        }
                    }
                }
            }
            other => {
                return Err(ScopeError::InvalidConfiguration(format!(
                    "scopes must be a map, a list or a name, got {other}"
                )))
            }
        }
        Ok(configuration)
    }

    /// Load declarations from the `scopes` key of a YAML/TOML/JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?;
        let value: Value = settings.get(SCOPES_CONFIG_KEY)?;
        debug!(path = %path.display(), "Loaded scope declarations");
        Self::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeFragment)> {
        self.entries
            .iter()
            .map(|(name, fragment)| (name.as_str(), fragment))
    }

    pub fn into_entries(self) -> Vec<(String, ScopeFragment)> {
        self.entries
    }

    fn try_insert(&mut self, name: &str, fragment: Value) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ScopeError::InvalidConfiguration(
                "scope names must not be empty".to_string(),
            ));
        }
        let fragment = match fragment {
            Value::Object(map) => map,
            _ => ScopeFragment::new(),
        };
        self.insert(name, fragment);
        Ok(())
    }

    fn insert(&mut self, name: &str, fragment: ScopeFragment) {
        let name = name.to_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = fragment,
            None => self.entries.push((name, fragment)),
        }
    }
}

impl TryFrom<Value> for ScopeConfiguration {
    type Error = ScopeError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}
