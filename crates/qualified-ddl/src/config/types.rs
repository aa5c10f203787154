//! Configuration type definitions.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::model::Model;

/// Alias of the database every project must configure.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings by alias, in file order.
    pub databases: IndexMap<String, DatabaseConfig>,

    /// Model metadata, in declaration order.
    #[serde(default)]
    pub models: Vec<Model>,
}

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Mysql,
    Oracle,
    #[serde(alias = "postgres")]
    Postgresql,
    Sqlite,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Mysql => "mysql",
            Engine::Oracle => "oracle",
            Engine::Postgresql => "postgresql",
            Engine::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for one database alias.
///
/// Credential swaps produce a new value via [`DatabaseConfig::with_user`];
/// a settings value is never edited in place once a backend holds it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine: Engine,

    /// Database name (MySQL falls back to it as schema).
    pub name: String,

    /// Login user (Oracle falls back to it as schema).
    #[serde(default)]
    pub user: String,

    /// Password. Never written back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Connection default schema for models that declare none.
    #[serde(default)]
    pub schema: Option<String>,

    /// Prefix applied to every declared schema (test schemas).
    #[serde(default)]
    pub schema_prefix: Option<String>,
}

impl DatabaseConfig {
    /// Minimal settings for an engine and database name.
    pub fn new(engine: Engine, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: None,
            schema: None,
            schema_prefix: None,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn schema_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.schema_prefix = Some(prefix.into());
        self
    }

    /// Copy of these settings authenticated as another user.
    pub fn with_user(&self, user: &str) -> Self {
        let mut settings = self.clone();
        settings.user = user.to_string();
        settings
    }

    /// Declared schema with the test prefix applied, or the connection default.
    pub fn convert_schema(&self, schema: Option<&str>) -> Option<String> {
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => Some(format!(
                "{}{}",
                self.schema_prefix.as_deref().unwrap_or(""),
                schema
            )),
            None => self.schema.clone().filter(|s| !s.is_empty()),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("engine", &self.engine)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("schema_prefix", &self.schema_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_user_leaves_original_untouched() {
        let settings = DatabaseConfig::new(Engine::Oracle, "xe").user("app");
        let swapped = settings.with_user("schema1");
        assert_eq!(settings.user, "app");
        assert_eq!(swapped.user, "schema1");
        assert_eq!(swapped.name, "xe");
    }

    #[test]
    fn test_convert_schema_prefix_and_default() {
        let settings = DatabaseConfig::new(Engine::Postgresql, "app")
            .default_schema("public")
            .schema_prefix("test_");
        assert_eq!(settings.convert_schema(Some("s1")).as_deref(), Some("test_s1"));
        assert_eq!(settings.convert_schema(None).as_deref(), Some("public"));
        assert_eq!(settings.convert_schema(Some("")).as_deref(), Some("public"));
    }

    #[test]
    fn test_engine_aliases() {
        let engine: Engine = serde_yaml::from_str("postgres").unwrap();
        assert_eq!(engine, Engine::Postgresql);
        assert!(serde_yaml::from_str::<Engine>("mssql").is_err());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let mut settings = DatabaseConfig::new(Engine::Mysql, "app").user("root");
        settings.password = "hunter2".into();
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(!yaml.contains("hunter2"));
    }
}
