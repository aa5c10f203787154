//! Database engine backends.
//!
//! This module provides engine-specific implementations of the core traits:
//!
//! - [`mysql`]: MySQL/MariaDB (schema = database)
//! - [`oracle`]: Oracle (schema = user, two-phase cross-schema references)
//! - [`postgres`]: PostgreSQL (schema = namespace on the search path)
//! - [`sqlite`]: SQLite (schemas emulated by table-name prefixing)
//! - [`common`]: Shared resolver and query helpers
//!
//! # Architecture
//!
//! Each engine module provides:
//! - A `SchemaBackend`: resolver, composer and DDL vocabulary
//! - An `Introspection`: catalog readers
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with `backend.rs` and `introspection.rs`
//! 2. Implement `SchemaBackend` and `Introspection`
//! 3. Add an enum variant to `BackendImpl` and an `Engine` value in `config`

pub mod common;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

pub use mysql::{MysqlBackend, MysqlIntrospection};
pub use oracle::{OracleBackend, OracleIntrospection};
pub use postgres::{PostgresBackend, PostgresIntrospection};
pub use sqlite::{SqliteBackend, SqliteIntrospection};

use crate::config::{DatabaseConfig, Engine};
use crate::core::model::{FieldKind, Model};
use crate::core::qname::QualifiedName;
use crate::core::traits::{Introspection, SchemaBackend};

/// Enum-based static dispatch for backends.
///
/// Every trait method expands to a plain `match` over the variants
/// instead of going through a vtable.
#[derive(Debug, Clone)]
pub enum BackendImpl {
    Mysql(MysqlBackend),
    Oracle(OracleBackend),
    Postgres(PostgresBackend),
    Sqlite(SqliteBackend),
}

macro_rules! dispatch {
    ($self:ident, $b:ident => $e:expr) => {
        match $self {
            BackendImpl::Mysql($b) => $e,
            BackendImpl::Oracle($b) => $e,
            BackendImpl::Postgres($b) => $e,
            BackendImpl::Sqlite($b) => $e,
        }
    };
}

impl BackendImpl {
    /// Create the backend for a database's engine.
    pub fn from_config(settings: &DatabaseConfig) -> Self {
        let settings = settings.clone();
        match settings.engine {
            Engine::Mysql => BackendImpl::Mysql(MysqlBackend::new(settings)),
            Engine::Oracle => BackendImpl::Oracle(OracleBackend::new(settings)),
            Engine::Postgresql => BackendImpl::Postgres(PostgresBackend::new(settings)),
            Engine::Sqlite => BackendImpl::Sqlite(SqliteBackend::new(settings)),
        }
    }

    /// Catalog readers for this backend.
    pub fn introspection(&self) -> Box<dyn Introspection> {
        match self {
            BackendImpl::Mysql(b) => Box::new(MysqlIntrospection::new(b.clone())),
            BackendImpl::Oracle(b) => Box::new(OracleIntrospection::new(b.clone())),
            BackendImpl::Postgres(b) => Box::new(PostgresIntrospection::new(b.clone())),
            BackendImpl::Sqlite(_) => Box::new(SqliteIntrospection),
        }
    }
}

impl SchemaBackend for BackendImpl {
    fn name(&self) -> &'static str {
        dispatch!(self, b => b.name())
    }

    fn settings(&self) -> &DatabaseConfig {
        dispatch!(self, b => b.settings())
    }

    fn quote_name(&self, name: &str) -> String {
        dispatch!(self, b => b.quote_name(name))
    }

    fn max_name_length(&self) -> usize {
        dispatch!(self, b => b.max_name_length())
    }

    fn convert_schema(&self, schema: Option<&str>) -> Option<String> {
        dispatch!(self, b => b.convert_schema(schema))
    }

    fn resolve(&self, name: &QualifiedName, force_schema: bool) -> QualifiedName {
        dispatch!(self, b => b.resolve(name, force_schema))
    }

    fn compose(&self, name: &QualifiedName) -> String {
        dispatch!(self, b => b.compose(name))
    }

    fn index_name(&self, model: &Model, column: &str) -> String {
        dispatch!(self, b => b.index_name(model, column))
    }

    fn qualified_index_name(&self, model: &Model, column: &str) -> String {
        dispatch!(self, b => b.qualified_index_name(model, column))
    }

    fn qualified_name_for_ref(&self, from: &QualifiedName, to: &QualifiedName) -> String {
        dispatch!(self, b => b.qualified_name_for_ref(from, to))
    }

    fn data_type(&self, kind: &FieldKind, column: &str) -> Option<String> {
        dispatch!(self, b => b.data_type(kind, column))
    }

    fn interprets_empty_strings_as_nulls(&self) -> bool {
        dispatch!(self, b => b.interprets_empty_strings_as_nulls())
    }

    fn tablespace_sql(&self, tablespace: &str, inline: bool) -> Option<String> {
        dispatch!(self, b => b.tablespace_sql(tablespace, inline))
    }

    fn deferrable_sql(&self) -> &'static str {
        dispatch!(self, b => b.deferrable_sql())
    }

    fn autoinc_sql(&self, name: &QualifiedName, column: &str) -> Vec<String> {
        dispatch!(self, b => b.autoinc_sql(name, column))
    }

    fn drop_sequence_sql(&self, name: &QualifiedName) -> Option<String> {
        dispatch!(self, b => b.drop_sequence_sql(name))
    }

    fn drop_foreignkey_sql(&self) -> &'static str {
        dispatch!(self, b => b.drop_foreignkey_sql())
    }

    fn inline_reference_eligible(
        &self,
        from: &QualifiedName,
        to: &QualifiedName,
        target_known: bool,
    ) -> bool {
        dispatch!(self, b => b.inline_reference_eligible(from, to, target_known))
    }

    fn needs_separate_connection(&self, from: &QualifiedName, to: &QualifiedName) -> bool {
        dispatch!(self, b => b.needs_separate_connection(from, to))
    }

    fn grant_references_sql(&self, table: &str, grantee: &str) -> Option<String> {
        dispatch!(self, b => b.grant_references_sql(table, grantee))
    }

    fn sql_create_schema(&self, schema: &str) -> Option<String> {
        dispatch!(self, b => b.sql_create_schema(schema))
    }

    fn sql_destroy_schema(&self, schema: &str) -> Option<String> {
        dispatch!(self, b => b.sql_destroy_schema(schema))
    }
}
