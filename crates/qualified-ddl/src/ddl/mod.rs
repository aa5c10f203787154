//! Schema-aware DDL generation.
//!
//! [`DdlGenerator`] turns model metadata into statement text for one
//! backend. It never talks to a database; callers decide whether statements
//! are executed or printed.
//!
//! - [`create`]: `CREATE TABLE` and deferred `ALTER TABLE .. ADD CONSTRAINT`
//! - [`index`]: `CREATE INDEX`
//! - [`drop`]: constraint removal, `DROP TABLE` and sequence cleanup
//! - [`pending`]: per-batch state for references awaiting their target

pub mod create;
pub mod drop;
pub mod index;
pub mod pending;

pub use pending::{BatchState, PendingReference, ReferenceMap};

use indexmap::IndexSet;
use tracing::warn;

use crate::core::identifier::{digest, truncate_name};
use crate::core::model::{Field, FieldKind, Model, ModelRegistry};
use crate::core::traits::SchemaBackend;
use crate::error::{DdlError, Result};

/// Statement generator bound to one backend and one set of models.
#[derive(Clone, Copy)]
pub struct DdlGenerator<'a> {
    backend: &'a dyn SchemaBackend,
    models: &'a ModelRegistry,
}

impl<'a> DdlGenerator<'a> {
    pub fn new(backend: &'a dyn SchemaBackend, models: &'a ModelRegistry) -> Self {
        Self { backend, models }
    }

    pub fn backend(&self) -> &'a dyn SchemaBackend {
        self.backend
    }

    pub fn models(&self) -> &'a ModelRegistry {
        self.models
    }

    /// Distinct resolved schemas of the models that own a table.
    pub fn schemas(&self) -> Vec<String> {
        let schemas: IndexSet<String> = self
            .models
            .iter()
            .filter(|m| m.owns_table())
            .filter_map(|m| {
                self.backend
                    .resolve(&m.qualified_name(), false)
                    .schema()
                    .map(str::to_string)
            })
            .collect();
        schemas.into_iter().collect()
    }

    /// `CREATE SCHEMA` statements for every schema the models live in.
    pub fn create_schema_statements(&self) -> Vec<String> {
        self.schemas()
            .iter()
            .filter_map(|s| self.backend.sql_create_schema(s))
            .collect()
    }

    /// Statements destroying every schema the models live in.
    pub fn destroy_schema_statements(&self) -> Vec<String> {
        self.schemas()
            .iter()
            .filter_map(|s| self.backend.sql_destroy_schema(s))
            .collect()
    }

    /// Column type of a field.
    ///
    /// A relation column takes the type of the field it references, with an
    /// auto primary key seen as a plain integer.
    pub fn column_type(&self, field: &Field) -> Result<String> {
        let kind = if field.is_relation() {
            self.relation_kind(field)?
        } else {
            field.kind.clone()
        };
        self.backend
            .data_type(&kind, &field.column())
            .ok_or_else(|| {
                DdlError::Config(format!(
                    "Field {} has no column type on {}",
                    field.name,
                    self.backend.name()
                ))
            })
    }

    fn relation_kind(&self, field: &Field) -> Result<FieldKind> {
        let mut target = self.models.target_field(field)?;
        for _ in 0..self.models.len() {
            if !target.is_relation() {
                return Ok(match &target.kind {
                    FieldKind::Auto | FieldKind::PositiveInteger => FieldKind::Integer,
                    FieldKind::PositiveSmallInteger => FieldKind::SmallInteger,
                    kind => kind.clone(),
                });
            }
            target = self.models.target_field(target)?;
        }
        Err(DdlError::Config(format!(
            "Field {} is part of a relation cycle",
            field.name
        )))
    }

    /// Name of the foreign key constraint `referencing.field -> target`.
    ///
    /// Creation and removal both derive the name from here, so a dropped
    /// constraint always matches the one that was created.
    pub fn foreign_key_constraint_name(
        &self,
        referencing: &Model,
        field: &Field,
        target: &Model,
    ) -> Result<String> {
        let target_column = self.models.target_field(field)?.column();
        let name = format!(
            "{}_refs_{}_{}",
            field.column(),
            target_column,
            digest(&[&referencing.db_table, &target.db_table])
        );
        let max_len = self.backend.max_name_length();
        if name.chars().count() > max_len {
            warn!("Constraint name {} exceeds {} characters, truncating", name, max_len);
        }
        Ok(truncate_name(&name, max_len))
    }

    fn tablespace_for(&self, model: &Model, field: &Field, inline: bool) -> Option<String> {
        field
            .db_tablespace
            .as_deref()
            .or(model.db_tablespace.as_deref())
            .and_then(|ts| self.backend.tablespace_sql(ts, inline))
    }

    fn field_of<'m>(&self, model: &'m Model, name: &str) -> Result<&'m Field> {
        model.get_field(name).ok_or_else(|| {
            DdlError::Config(format!("Model {} has no field {}", model.name, name))
        })
    }
}

impl std::fmt::Debug for DdlGenerator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdlGenerator")
            .field("backend", &self.backend.name())
            .field("models", &self.models.len())
            .finish()
    }
}
