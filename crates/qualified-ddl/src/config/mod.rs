//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::core::model::ModelRegistry;
use crate::error::{DdlError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Settings of a database alias.
    pub fn database(&self, alias: &str) -> Result<&DatabaseConfig> {
        self.databases
            .get(alias)
            .ok_or_else(|| DdlError::Config(format!("database '{}' is not configured", alias)))
    }

    /// Registry of the configured models.
    pub fn model_registry(&self) -> Result<ModelRegistry> {
        ModelRegistry::new(self.models.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
databases:
  default:
    engine: oracle
    name: xe
    user: app
    password: secret
models:
  - name: dbschemas.SameName1
    db_table: sn
    db_schema: schema1
    fields:
      - { name: id, type: auto, primary_key: true }
"#;

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(YAML).unwrap();
        let db = config.database(DEFAULT_DB_ALIAS).unwrap();
        assert_eq!(db.engine, Engine::Oracle);
        assert_eq!(db.user, "app");
        assert_eq!(config.model_registry().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_alias() {
        let config = Config::from_yaml(YAML).unwrap();
        let err = config.database("other").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/qualified-ddl.yaml").unwrap_err();
        assert!(matches!(err, DdlError::Io(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("databases: [unclosed"),
            Err(DdlError::Yaml(_))
        ));
    }
}
