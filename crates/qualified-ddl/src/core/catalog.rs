//! Connection registry for explicit dependency injection.
//!
//! The [`ConnectionRegistry`] maps database aliases to their connection
//! settings. It is built once from the configuration and passed to every
//! entry point that needs a backend, instead of living in global state.

use indexmap::IndexMap;

use crate::config::{Config, DatabaseConfig, DEFAULT_DB_ALIAS};
use crate::drivers::BackendImpl;
use crate::error::{DdlError, Result};

/// Registry of database settings by alias.
///
/// # Example
///
/// ```rust,ignore
/// let registry = ConnectionRegistry::from_config(&config);
/// let backend = registry.backend("default")?;
/// println!("{}", backend.compose(&model.qualified_name()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    databases: IndexMap<String, DatabaseConfig>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every database of a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            databases: config.databases.clone(),
        }
    }

    /// Register (or replace) the settings of an alias.
    pub fn register(&mut self, alias: impl Into<String>, settings: DatabaseConfig) {
        self.databases.insert(alias.into(), settings);
    }

    /// Settings of an alias.
    pub fn get(&self, alias: &str) -> Result<&DatabaseConfig> {
        self.databases
            .get(alias)
            .ok_or_else(|| DdlError::Config(format!("database '{}' is not configured", alias)))
    }

    /// Settings of the default alias.
    pub fn default_database(&self) -> Result<&DatabaseConfig> {
        self.get(DEFAULT_DB_ALIAS)
    }

    /// Backend for an alias.
    pub fn backend(&self, alias: &str) -> Result<BackendImpl> {
        self.get(alias).map(BackendImpl::from_config)
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Engine;
    use crate::core::traits::SchemaBackend;

    #[test]
    fn test_registry_lookup() {
        let mut registry = ConnectionRegistry::new();
        registry.register("default", DatabaseConfig::new(Engine::Postgresql, "app").user("a"));
        registry.register("legacy", DatabaseConfig::new(Engine::Mysql, "old").user("b"));

        assert_eq!(registry.default_database().unwrap().name, "app");
        assert_eq!(registry.backend("legacy").unwrap().name(), "mysql");
        assert_eq!(registry.aliases().collect::<Vec<_>>(), vec!["default", "legacy"]);
    }

    #[test]
    fn test_registry_unknown_alias() {
        let registry = ConnectionRegistry::new();
        let err = registry.backend("default").unwrap_err();
        assert!(err.to_string().contains("'default' is not configured"));
    }
}
