//! Capability traits at the seams between the DDL engine and the outside world.
//!
//! - [`SchemaBackend`]: per-engine name resolution, composition and DDL fragments
//! - [`Connection`] / [`Connector`]: statement execution and credentialed connect
//! - [`Introspection`]: catalog readers expressed in terms of [`QualifiedName`]
//!
//! # Design Patterns
//!
//! - **Strategy**: each engine supplies its own `SchemaBackend`
//! - **Template Method**: default trait methods define the generic behaviour,
//!   engines override only where their semantics differ

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::DatabaseConfig;
use crate::error::{DdlError, Result};

use super::identifier::{digest, truncate_name};
use super::model::{FieldKind, Model};
use super::qname::QualifiedName;
use super::value::{Row, Value};

/// Engine-specific naming and DDL vocabulary.
///
/// All methods are pure: they depend only on their arguments and the
/// connection settings the backend was built from.
pub trait SchemaBackend: Send + Sync {
    /// Engine name (e.g., "mysql", "postgresql").
    fn name(&self) -> &'static str;

    /// Connection settings this backend resolves against.
    fn settings(&self) -> &DatabaseConfig;

    /// Quote a single identifier.
    fn quote_name(&self, name: &str) -> String;

    /// Longest identifier the engine accepts.
    fn max_name_length(&self) -> usize;

    /// Canonical form of a declared schema, or the connection default for `None`.
    fn convert_schema(&self, schema: Option<&str>) -> Option<String> {
        self.settings().convert_schema(schema)
    }

    /// Resolve a name so it carries the engine's real schema identifier.
    ///
    /// Never fails: a resolved name without a schema means "unqualified".
    fn resolve(&self, name: &QualifiedName, force_schema: bool) -> QualifiedName;

    /// Quoted SQL text for a name.
    fn compose(&self, name: &QualifiedName) -> String {
        let name = self.resolve(name, false);
        match name.schema() {
            Some(schema) => format!(
                "{}.{}",
                self.quote_name(schema),
                self.quote_name(name.table())
            ),
            None => self.quote_name(name.table()),
        }
    }

    /// Unquoted, length-limited index name for a model column.
    fn index_name(&self, model: &Model, column: &str) -> String {
        truncate_name(
            &format!("{}_{}", model.db_table, digest(&[column])),
            self.max_name_length(),
        )
    }

    /// Index name as it appears after `CREATE INDEX`.
    fn qualified_index_name(&self, model: &Model, column: &str) -> String {
        self.compose(&model.qualified_name().with_table(self.index_name(model, column)))
    }

    /// Composed name of `to` as referenced from a table named `from`.
    fn qualified_name_for_ref(&self, _from: &QualifiedName, to: &QualifiedName) -> String {
        self.compose(to)
    }

    /// Column type for a non-relation field kind; `None` for kinds without a column.
    fn data_type(&self, kind: &FieldKind, column: &str) -> Option<String>;

    /// Whether the engine stores `''` as NULL.
    fn interprets_empty_strings_as_nulls(&self) -> bool {
        false
    }

    fn tablespace_sql(&self, _tablespace: &str, _inline: bool) -> Option<String> {
        None
    }

    /// Suffix appended to every foreign key clause.
    fn deferrable_sql(&self) -> &'static str {
        ""
    }

    /// Extra statements supporting an auto-assigned primary key.
    fn autoinc_sql(&self, _name: &QualifiedName, _column: &str) -> Vec<String> {
        Vec::new()
    }

    /// Statement dropping the auto-increment sequence of a table.
    fn drop_sequence_sql(&self, _name: &QualifiedName) -> Option<String> {
        None
    }

    /// Keyword phrase used in `ALTER TABLE .. <phrase> <name>` to drop a foreign key.
    fn drop_foreignkey_sql(&self) -> &'static str {
        "DROP CONSTRAINT"
    }

    /// Whether a reference can be declared inside `CREATE TABLE`.
    fn inline_reference_eligible(
        &self,
        _from: &QualifiedName,
        _to: &QualifiedName,
        target_known: bool,
    ) -> bool {
        target_known
    }

    /// Whether creating a reference requires connecting as another schema owner.
    fn needs_separate_connection(&self, _from: &QualifiedName, _to: &QualifiedName) -> bool {
        false
    }

    /// Statement letting `grantee` reference `table`, issued by the table's owner.
    fn grant_references_sql(&self, _table: &str, _grantee: &str) -> Option<String> {
        None
    }

    fn sql_create_schema(&self, schema: &str) -> Option<String> {
        Some(format!("CREATE SCHEMA {}", self.quote_name(schema)))
    }

    fn sql_destroy_schema(&self, _schema: &str) -> Option<String> {
        None
    }
}

/// An open database connection.
#[async_trait]
pub trait Connection: Send {
    /// Settings the connection was opened with.
    fn settings(&self) -> &DatabaseConfig;

    /// Execute one statement and return its rows (empty for DDL).
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Disable constraint checking. Returns whether checking was actually disabled.
    async fn disable_constraint_checking(&mut self) -> Result<bool> {
        Ok(false)
    }

    async fn enable_constraint_checking(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens connections for given settings.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &DatabaseConfig) -> Result<Box<dyn Connection>>;
}

/// Column description returned by [`Introspection::get_table_description`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
}

/// Index flags of a single-column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub primary_key: bool,
    pub unique: bool,
}

/// A foreign key column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyColumn {
    pub column: String,
    pub referenced_table: QualifiedName,
    pub referenced_column: String,
}

/// A relation by column position (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub column_index: usize,
    pub target_column_index: usize,
    pub target_table: QualifiedName,
}

/// Catalog readers for an existing database.
///
/// Operations an engine does not implement return [`DdlError::Unsupported`],
/// which callers may treat as an empty result.
#[async_trait]
pub trait Introspection: Send + Sync {
    /// Engine name used in unsupported-operation errors.
    fn backend_name(&self) -> &'static str;

    /// Normalize an identifier read from the catalog for comparison.
    fn identifier_converter(&self, name: &str) -> String {
        name.to_string()
    }

    async fn get_schema_list(&self, _conn: &mut dyn Connection) -> Result<Vec<String>> {
        Err(DdlError::unsupported(self.backend_name(), "get_schema_list"))
    }

    /// Tables visible from the connection without qualification.
    async fn get_visible_tables_list(
        &self,
        _conn: &mut dyn Connection,
    ) -> Result<Vec<QualifiedName>> {
        Err(DdlError::unsupported(
            self.backend_name(),
            "get_visible_tables_list",
        ))
    }

    /// Tables in the given schemas.
    async fn get_qualified_tables_list(
        &self,
        _conn: &mut dyn Connection,
        _schemas: &[String],
    ) -> Result<Vec<QualifiedName>> {
        Err(DdlError::unsupported(
            self.backend_name(),
            "get_qualified_tables_list",
        ))
    }

    async fn get_table_description(
        &self,
        _conn: &mut dyn Connection,
        _name: &QualifiedName,
    ) -> Result<Vec<ColumnInfo>> {
        Err(DdlError::unsupported(
            self.backend_name(),
            "get_table_description",
        ))
    }

    async fn get_relations(
        &self,
        _conn: &mut dyn Connection,
        _name: &QualifiedName,
    ) -> Result<Vec<Relation>> {
        Err(DdlError::unsupported(self.backend_name(), "get_relations"))
    }

    async fn get_key_columns(
        &self,
        _conn: &mut dyn Connection,
        _name: &QualifiedName,
    ) -> Result<Vec<KeyColumn>> {
        Err(DdlError::unsupported(self.backend_name(), "get_key_columns"))
    }

    /// Single-column indexes keyed by column name.
    async fn get_indexes(
        &self,
        _conn: &mut dyn Connection,
        _name: &QualifiedName,
    ) -> Result<IndexMap<String, IndexInfo>> {
        Err(DdlError::unsupported(self.backend_name(), "get_indexes"))
    }

    async fn get_primary_key_column(
        &self,
        conn: &mut dyn Connection,
        name: &QualifiedName,
    ) -> Result<Option<String>> {
        let indexes = self.get_indexes(conn, name).await?;
        Ok(indexes
            .into_iter()
            .find(|(_, info)| info.primary_key)
            .map(|(column, _)| column))
    }
}
