//! Error types for the named scope engine.
//!
//! Scope resolution itself is permissive: unknown scopes and malformed
//! finder names never surface here. These variants cover configuration
//! and setup only. Errors raised by the find-execution primitive keep
//! their own type (see [`crate::model::FindExecutor::Error`]).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScopeError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid find type: {0}")]
    InvalidFindType(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

impl From<config::ConfigError> for ScopeError {
    fn from(error: config::ConfigError) -> Self {
        ScopeError::ConfigurationError(error.to_string())
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(error: serde_json::Error) -> Self {
        ScopeError::InvalidConfiguration(format!("JSON serialization error: {error}"))
    }
}

impl From<regex::Error> for ScopeError {
    fn from(error: regex::Error) -> Self {
        ScopeError::InvalidPattern(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;
