//! PostgreSQL naming and DDL vocabulary.
//!
//! PostgreSQL schemas are true namespaces searched through `search_path`, so
//! there is no single schema an unqualified name is guaranteed to live in.
//! Resolution substitutes the configured connection schema and otherwise
//! leaves the name unqualified.

use crate::config::DatabaseConfig;
use crate::core::identifier::quote_double;
use crate::core::model::{FieldKind, Model};
use crate::core::qname::QualifiedName;
use crate::core::traits::SchemaBackend;

/// PostgreSQL identifier length limit (NAMEDATALEN - 1).
const MAX_NAME_LENGTH: usize = 63;

/// PostgreSQL backend.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    settings: DatabaseConfig,
}

impl PostgresBackend {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self { settings }
    }
}

impl SchemaBackend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn settings(&self) -> &DatabaseConfig {
        &self.settings
    }

    fn quote_name(&self, name: &str) -> String {
        quote_double(name)
    }

    fn max_name_length(&self) -> usize {
        MAX_NAME_LENGTH
    }

    /// `force_schema` has no further fallback here.
    fn resolve(&self, name: &QualifiedName, _force_schema: bool) -> QualifiedName {
        if name.is_resolved() {
            return name.clone();
        }
        let schema = self.convert_schema(name.schema());
        name.clone().into_resolved(schema)
    }

    /// An index always lives in its table's schema and cannot be qualified.
    fn qualified_index_name(&self, model: &Model, column: &str) -> String {
        self.quote_name(&self.index_name(model, column))
    }

    fn data_type(&self, kind: &FieldKind, column: &str) -> Option<String> {
        let ty = match kind {
            FieldKind::Auto => "serial".to_string(),
            FieldKind::BigInteger => "bigint".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Char { max_length } | FieldKind::Slug { max_length } => {
                format!("varchar({})", max_length)
            }
            FieldKind::Text => "text".to_string(),
            FieldKind::Date => "date".to_string(),
            FieldKind::DateTime => "timestamp with time zone".to_string(),
            FieldKind::Time => "time".to_string(),
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            } => format!("numeric({}, {})", max_digits, decimal_places),
            FieldKind::Float => "double precision".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::SmallInteger => "smallint".to_string(),
            FieldKind::PositiveInteger => {
                format!("integer CHECK ({} >= 0)", self.quote_name(column))
            }
            FieldKind::PositiveSmallInteger => {
                format!("smallint CHECK ({} >= 0)", self.quote_name(column))
            }
            FieldKind::GenericIpAddress => "inet".to_string(),
            FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. } => return None,
        };
        Some(ty)
    }

    fn tablespace_sql(&self, tablespace: &str, inline: bool) -> Option<String> {
        Some(format!(
            "{}TABLESPACE {}",
            if inline { "USING INDEX " } else { "" },
            self.quote_name(tablespace)
        ))
    }

    fn deferrable_sql(&self) -> &'static str {
        " DEFERRABLE INITIALLY DEFERRED"
    }

    fn sql_destroy_schema(&self, schema: &str) -> Option<String> {
        Some(format!("DROP SCHEMA {} CASCADE", self.quote_name(schema)))
    }
}
