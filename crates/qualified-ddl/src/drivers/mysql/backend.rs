//! MySQL naming and DDL vocabulary.
//!
//! MySQL has no namespaces below the database, so a schema here *is* a
//! database. Index names cannot be qualified, which means two tables with the
//! same name in different schemas would produce colliding index names; the
//! schema is therefore folded into the index name itself.

use crate::config::DatabaseConfig;
use crate::core::identifier::{digest, quote_backtick, truncate_name};
use crate::core::model::{FieldKind, Model};
use crate::core::qname::QualifiedName;
use crate::core::traits::SchemaBackend;
use crate::drivers::common::resolve_with_fallback;

/// MySQL identifier length limit.
const MAX_NAME_LENGTH: usize = 64;

/// MySQL backend.
#[derive(Debug, Clone)]
pub struct MysqlBackend {
    settings: DatabaseConfig,
}

impl MysqlBackend {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self { settings }
    }
}

impl SchemaBackend for MysqlBackend {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn settings(&self) -> &DatabaseConfig {
        &self.settings
    }

    fn quote_name(&self, name: &str) -> String {
        quote_backtick(name)
    }

    fn max_name_length(&self) -> usize {
        MAX_NAME_LENGTH
    }

    fn resolve(&self, name: &QualifiedName, force_schema: bool) -> QualifiedName {
        resolve_with_fallback(
            name,
            force_schema,
            |schema| self.convert_schema(schema),
            &self.settings.name,
        )
    }

    /// `<schema fragment>_<table>_<digest>`, cut to 64 characters.
    ///
    /// The schema fragment is at most half the limit. When the whole name is
    /// still too long the fragment shrinks first (down to one character),
    /// then the table part. A cut table folds its full name into the digest;
    /// the digest is never cut.
    fn index_name(&self, model: &Model, column: &str) -> String {
        let max_len = self.max_name_length();
        let mut suffix = format!("_{}", digest(&[column]));
        let schema = self.convert_schema(model.db_schema.as_deref());

        let Some(schema) = schema else {
            return truncate_name(&format!("{}{}", model.db_table, suffix), max_len);
        };

        let mut fragment: Vec<char> = truncate_name(&schema, max_len / 2).chars().collect();
        let mut table: Vec<char> = model.db_table.chars().collect();
        let fixed = suffix.chars().count() + 1;

        if fragment.len() + table.len() + fixed > max_len {
            let room = max_len.saturating_sub(table.len() + fixed).max(1);
            fragment.truncate(room.min(fragment.len()));
        }
        if fragment.len() + table.len() + fixed > max_len {
            suffix = format!("_{}", digest(&[model.db_table.as_str(), column]));
            let fixed = suffix.chars().count() + 1;
            table.truncate(max_len.saturating_sub(fragment.len() + fixed));
        }

        format!(
            "{}_{}{}",
            fragment.into_iter().collect::<String>(),
            table.into_iter().collect::<String>(),
            suffix
        )
    }

    fn qualified_index_name(&self, model: &Model, column: &str) -> String {
        self.quote_name(&self.index_name(model, column))
    }

    /// References always name the target's database, falling back to the
    /// connection's database for unqualified targets.
    fn qualified_name_for_ref(&self, _from: &QualifiedName, to: &QualifiedName) -> String {
        let to = self.resolve(to, false);
        let to = match to.schema() {
            Some(_) => to,
            None => to.into_resolved(Some(self.settings.name.clone())),
        };
        self.compose(&to)
    }

    fn data_type(&self, kind: &FieldKind, _column: &str) -> Option<String> {
        let ty = match kind {
            FieldKind::Auto => "integer AUTO_INCREMENT".to_string(),
            FieldKind::BigInteger => "bigint".to_string(),
            FieldKind::Boolean => "bool".to_string(),
            FieldKind::Char { max_length } | FieldKind::Slug { max_length } => {
                format!("varchar({})", max_length)
            }
            FieldKind::Text => "longtext".to_string(),
            FieldKind::Date => "date".to_string(),
            FieldKind::DateTime => "datetime".to_string(),
            FieldKind::Time => "time".to_string(),
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            } => format!("numeric({}, {})", max_digits, decimal_places),
            FieldKind::Float => "double precision".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::SmallInteger => "smallint".to_string(),
            FieldKind::PositiveInteger => "integer UNSIGNED".to_string(),
            FieldKind::PositiveSmallInteger => "smallint UNSIGNED".to_string(),
            FieldKind::GenericIpAddress => "char(39)".to_string(),
            FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. } => return None,
        };
        Some(ty)
    }

    fn drop_foreignkey_sql(&self) -> &'static str {
        "DROP FOREIGN KEY"
    }

    /// Every MySQL reference is added by `ALTER TABLE` once all tables exist.
    fn inline_reference_eligible(
        &self,
        _from: &QualifiedName,
        _to: &QualifiedName,
        _target_known: bool,
    ) -> bool {
        false
    }

    fn sql_create_schema(&self, schema: &str) -> Option<String> {
        Some(format!("CREATE DATABASE {}", self.quote_name(schema)))
    }

    fn sql_destroy_schema(&self, schema: &str) -> Option<String> {
        Some(format!("DROP DATABASE {}", self.quote_name(schema)))
    }
}
