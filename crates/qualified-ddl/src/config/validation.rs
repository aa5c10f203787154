//! Configuration validation.

use super::{Config, Engine, DEFAULT_DB_ALIAS};
use crate::core::model::ModelRegistry;
use crate::error::{DdlError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.databases.is_empty() {
        return Err(DdlError::Config(
            "at least one database must be configured".into(),
        ));
    }
    if !config.databases.contains_key(DEFAULT_DB_ALIAS) {
        return Err(DdlError::Config(format!(
            "You must define a '{}' database",
            DEFAULT_DB_ALIAS
        )));
    }

    for (alias, db) in &config.databases {
        if db.name.is_empty() {
            return Err(DdlError::Config(format!(
                "databases.{}.name is required",
                alias
            )));
        }
        if db.engine != Engine::Sqlite && db.user.is_empty() {
            return Err(DdlError::Config(format!(
                "databases.{}.user is required for {}",
                alias, db.engine
            )));
        }
    }

    // Relation targets, identifiers and unique_together members
    ModelRegistry::new(config.models.clone())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::core::model::{Field, Model};
    use indexmap::IndexMap;

    fn valid_config() -> Config {
        let mut databases = IndexMap::new();
        databases.insert(
            DEFAULT_DB_ALIAS.to_string(),
            DatabaseConfig::new(Engine::Postgresql, "app").user("app"),
        );
        Config {
            databases,
            models: vec![Model::new("app.Author", "author").field(Field::auto("id"))],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_default_alias() {
        let mut config = valid_config();
        let db = config.databases.shift_remove(DEFAULT_DB_ALIAS).unwrap();
        config.databases.insert("other".into(), db);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("'default'"));
    }

    #[test]
    fn test_missing_user() {
        let mut config = valid_config();
        config.databases[DEFAULT_DB_ALIAS].user = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_sqlite_needs_no_user() {
        let mut config = valid_config();
        config.databases[DEFAULT_DB_ALIAS] = DatabaseConfig::new(Engine::Sqlite, "app.db");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_model_reference() {
        let mut config = valid_config();
        config.models.push(
            Model::new("app.Book", "book")
                .field(Field::auto("id"))
                .field(Field::foreign_key("author", "app.Nobody")),
        );
        assert!(matches!(
            validate(&config),
            Err(DdlError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_database_config_debug_redacts_password() {
        let mut config = valid_config();
        config.databases[DEFAULT_DB_ALIAS].password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.databases[DEFAULT_DB_ALIAS]);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}
