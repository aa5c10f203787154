//! SQLite naming and DDL vocabulary with prefix-emulated schemas.

use crate::config::DatabaseConfig;
use crate::core::identifier::quote_double;
use crate::core::model::FieldKind;
use crate::core::qname::QualifiedName;
use crate::core::traits::SchemaBackend;

/// SQLite backend.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    settings: DatabaseConfig,
}

impl SqliteBackend {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self { settings }
    }
}

impl SchemaBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn settings(&self) -> &DatabaseConfig {
        &self.settings
    }

    fn quote_name(&self, name: &str) -> String {
        quote_double(name)
    }

    /// SQLite does not limit identifier length.
    fn max_name_length(&self) -> usize {
        usize::MAX
    }

    fn resolve(&self, name: &QualifiedName, _force_schema: bool) -> QualifiedName {
        if name.is_resolved() {
            return name.clone();
        }
        let schema = self.convert_schema(name.schema());
        name.clone().into_resolved(schema)
    }

    /// `"<schema>_<table>"`, or `"<table>"` without a schema.
    fn compose(&self, name: &QualifiedName) -> String {
        let name = self.resolve(name, false);
        match name.schema() {
            Some(schema) => self.quote_name(&format!("{}_{}", schema, name.table())),
            None => self.quote_name(name.table()),
        }
    }

    fn data_type(&self, kind: &FieldKind, _column: &str) -> Option<String> {
        let ty = match kind {
            FieldKind::Auto => "integer".to_string(),
            FieldKind::BigInteger => "bigint".to_string(),
            FieldKind::Boolean => "bool".to_string(),
            FieldKind::Char { max_length } | FieldKind::Slug { max_length } => {
                format!("varchar({})", max_length)
            }
            FieldKind::Text => "text".to_string(),
            FieldKind::Date => "date".to_string(),
            FieldKind::DateTime => "datetime".to_string(),
            FieldKind::Time => "time".to_string(),
            FieldKind::Decimal { .. } => "decimal".to_string(),
            FieldKind::Float => "real".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::SmallInteger => "smallint".to_string(),
            FieldKind::PositiveInteger => "integer unsigned".to_string(),
            FieldKind::PositiveSmallInteger => "smallint unsigned".to_string(),
            FieldKind::GenericIpAddress => "char(39)".to_string(),
            FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. } => return None,
        };
        Some(ty)
    }

    /// Prefixed tables need no namespace of their own.
    fn sql_create_schema(&self, _schema: &str) -> Option<String> {
        None
    }
}
