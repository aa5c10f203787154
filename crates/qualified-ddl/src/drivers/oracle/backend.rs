//! Oracle naming and DDL vocabulary.
//!
//! In Oracle a schema is a user. Identifiers are compared in lower case here
//! but are always emitted upper-cased inside quotes, cut to 30 characters.
//! A foreign key into another schema can only be created while connected as
//! the referencing table's owner, after the target's owner granted
//! `REFERENCES`; such references never appear inline.

use crate::config::DatabaseConfig;
use crate::core::identifier::{quote_double, truncate_name};
use crate::core::model::FieldKind;
use crate::core::qname::QualifiedName;
use crate::core::traits::SchemaBackend;
use crate::drivers::common::resolve_with_fallback;

/// Oracle identifier length limit.
const MAX_NAME_LENGTH: usize = 30;

/// Oracle backend.
#[derive(Debug, Clone)]
pub struct OracleBackend {
    settings: DatabaseConfig,
}

impl OracleBackend {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self { settings }
    }

    /// Schema of the connection's own identity.
    pub fn default_schema(&self) -> Option<String> {
        self.convert_schema(None).or_else(|| {
            Some(self.settings.user.to_lowercase()).filter(|u| !u.is_empty())
        })
    }

    fn sequence_name(&self, name: &QualifiedName) -> QualifiedName {
        let base = truncate_name(name.table(), MAX_NAME_LENGTH - 3).to_uppercase();
        name.with_table(format!("{}_SQ", base))
    }

    fn trigger_name(&self, name: &QualifiedName) -> QualifiedName {
        let base = truncate_name(name.table(), MAX_NAME_LENGTH - 3).to_uppercase();
        name.with_table(format!("{}_TR", base))
    }
}

impl SchemaBackend for OracleBackend {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn settings(&self) -> &DatabaseConfig {
        &self.settings
    }

    fn quote_name(&self, name: &str) -> String {
        if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
            return name.to_uppercase();
        }
        quote_double(&truncate_name(&name.to_uppercase(), MAX_NAME_LENGTH)).to_uppercase()
    }

    fn max_name_length(&self) -> usize {
        MAX_NAME_LENGTH
    }

    fn convert_schema(&self, schema: Option<&str>) -> Option<String> {
        self.settings
            .convert_schema(schema)
            .map(|s| s.to_lowercase())
    }

    fn resolve(&self, name: &QualifiedName, force_schema: bool) -> QualifiedName {
        resolve_with_fallback(
            name,
            force_schema,
            |schema| self.convert_schema(schema),
            &self.settings.user.to_lowercase(),
        )
    }

    fn data_type(&self, kind: &FieldKind, column: &str) -> Option<String> {
        let qn_column = self.quote_name(column);
        let ty = match kind {
            FieldKind::Auto => "NUMBER(11)".to_string(),
            FieldKind::BigInteger => "NUMBER(19)".to_string(),
            FieldKind::Boolean => format!("NUMBER(1) CHECK ({} IN (0,1))", qn_column),
            FieldKind::Char { max_length } | FieldKind::Slug { max_length } => {
                format!("NVARCHAR2({})", max_length)
            }
            FieldKind::Text => "NCLOB".to_string(),
            FieldKind::Date => "DATE".to_string(),
            FieldKind::DateTime | FieldKind::Time => "TIMESTAMP".to_string(),
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            } => format!("NUMBER({}, {})", max_digits, decimal_places),
            FieldKind::Float => "DOUBLE PRECISION".to_string(),
            FieldKind::Integer | FieldKind::SmallInteger => "NUMBER(11)".to_string(),
            FieldKind::PositiveInteger | FieldKind::PositiveSmallInteger => {
                format!("NUMBER(11) CHECK ({} >= 0)", qn_column)
            }
            FieldKind::GenericIpAddress => "VARCHAR2(39)".to_string(),
            FieldKind::ForeignKey { .. } | FieldKind::OneToOne { .. } => return None,
        };
        Some(ty)
    }

    fn interprets_empty_strings_as_nulls(&self) -> bool {
        true
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

    /// A sequence plus a trigger filling the primary key from it.
    fn autoinc_sql(&self, name: &QualifiedName, column: &str) -> Vec<String> {
        let sequence = self.compose(&self.sequence_name(name));
        let trigger = self.compose(&self.trigger_name(name));
        let table = self.compose(name);
        let column = self.quote_name(column);
        vec![
            format!("CREATE SEQUENCE {}", sequence),
            format!(
                "CREATE OR REPLACE TRIGGER {trigger}\n\
                 BEFORE INSERT ON {table}\n\
                 FOR EACH ROW\n\
                 WHEN (new.{column} IS NULL)\n    \
                 BEGIN\n        \
                 SELECT {sequence}.nextval\n        \
                 INTO :new.{column} FROM dual;\n    \
                 END;\n/"
            ),
        ]
    }

    fn drop_sequence_sql(&self, name: &QualifiedName) -> Option<String> {
        Some(format!(
            "DROP SEQUENCE {}",
            self.compose(&self.sequence_name(name))
        ))
    }

    fn inline_reference_eligible(
        &self,
        from: &QualifiedName,
        to: &QualifiedName,
        target_known: bool,
    ) -> bool {
        target_known && !self.needs_separate_connection(from, to)
    }

    /// True when `from` lives outside the connection's own schema, or when
    /// the two names resolve to different schemas.
    fn needs_separate_connection(&self, from: &QualifiedName, to: &QualifiedName) -> bool {
        let default_schema = self.default_schema();
        let from = self.resolve(from, true);
        let to = self.resolve(to, true);
        default_schema.as_deref() != from.schema() || to.schema() != from.schema()
    }

    fn grant_references_sql(&self, table: &str, grantee: &str) -> Option<String> {
        Some(format!(
            "GRANT REFERENCES ON {} TO {}",
            self.quote_name(table),
            self.quote_name(grantee)
        ))
    }

    /// Schemas are users and are provisioned outside generated DDL.
    fn sql_create_schema(&self, _schema: &str) -> Option<String> {
        None
    }

    fn sql_destroy_schema(&self, schema: &str) -> Option<String> {
        Some(format!("DROP USER {} CASCADE", self.quote_name(schema)))
    }
}
