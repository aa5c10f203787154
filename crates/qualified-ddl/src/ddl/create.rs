//! `CREATE TABLE` generation and draining of deferred foreign keys.

use tracing::{debug, warn};

use super::pending::{BatchState, PendingReference};
use super::DdlGenerator;
use crate::core::model::{Field, Model};
use crate::error::Result;

/// Statements produced for one model of a create batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStatements {
    /// `CREATE TABLE` followed by auto-increment support.
    pub create: Vec<String>,
    /// Foreign keys that became creatable once this model's table existed.
    pub deferred: Vec<String>,
}

impl DdlGenerator<'_> {
    /// `CREATE TABLE` statements for a model.
    ///
    /// References that cannot be declared inline are recorded in `state`
    /// under their target model.
    pub fn create_table_statements(
        &self,
        model: &Model,
        state: &mut BatchState,
    ) -> Result<Vec<String>> {
        if !model.owns_table() {
            debug!("Skipping {}: no table of its own", model.name);
            return Ok(Vec::new());
        }
        let backend = self.backend();
        let qname = model.qualified_name();
        let mut lines = Vec::with_capacity(model.fields.len() + model.unique_together.len());

        for field in &model.fields {
            let mut parts = vec![
                backend.quote_name(&field.column()),
                self.column_type(field)?,
            ];
            let null = field.null
                || (field.kind.allows_empty_strings()
                    && !field.primary_key
                    && backend.interprets_empty_strings_as_nulls());
            if !null {
                parts.push("NOT NULL".to_string());
            }
            if field.primary_key {
                parts.push("PRIMARY KEY".to_string());
            } else if field.is_unique() {
                parts.push("UNIQUE".to_string());
            }
            if field.is_unique() {
                if let Some(tablespace) = self.tablespace_for(model, field, true) {
                    parts.push(tablespace);
                }
            }
            if field.is_relation() {
                if let Some(reference) = self.inline_reference(model, field, state)? {
                    parts.push(reference);
                }
            }
            lines.push(parts.join(" "));
        }

        for group in &model.unique_together {
            let columns = group
                .iter()
                .map(|name| Ok(backend.quote_name(&self.field_of(model, name)?.column())))
                .collect::<Result<Vec<_>>>()?;
            lines.push(format!("UNIQUE ({})", columns.join(", ")));
        }

        let mut statement = format!(
            "CREATE TABLE {} (\n    {}\n)",
            backend.compose(&qname),
            lines.join(",\n    ")
        );
        if let Some(tablespace) = model
            .db_tablespace
            .as_deref()
            .and_then(|ts| backend.tablespace_sql(ts, false))
        {
            statement.push('\n');
            statement.push_str(&tablespace);
        }

        let mut output = vec![statement];
        if let Some(auto) = model.auto_field() {
            output.extend(backend.autoinc_sql(&qname, &auto.column()));
        }
        debug!(
            "Generated {} statement(s) for {}",
            output.len(),
            backend.compose(&qname)
        );
        Ok(output)
    }

    /// Inline `REFERENCES` clause, or `None` after deferring the reference.
    fn inline_reference(
        &self,
        model: &Model,
        field: &Field,
        state: &mut BatchState,
    ) -> Result<Option<String>> {
        let backend = self.backend();
        let target = self.models().target_of(field)?;
        let from = model.qualified_name();
        let to = target.qualified_name();
        if !backend.inline_reference_eligible(&from, &to, state.is_known(&target.name)) {
            state.defer(&target.name, PendingReference::new(&model.name, &field.name));
            return Ok(None);
        }
        let target_field = self.models().target_field(field)?;
        Ok(Some(format!(
            "REFERENCES {} ({}){}",
            backend.qualified_name_for_ref(&from, &to),
            backend.quote_name(&target_field.column()),
            backend.deferrable_sql()
        )))
    }

    /// `ALTER TABLE .. ADD CONSTRAINT` for every reference waiting on `target`.
    ///
    /// Drained references leave `state`. Those that must be created from
    /// another schema owner's connection move to the cross-schema set instead
    /// of producing a statement. References to a model without a table of its
    /// own are discarded.
    pub fn pending_reference_statements(
        &self,
        target: &Model,
        state: &mut BatchState,
    ) -> Result<Vec<String>> {
        let references = state.take_pending(&target.name);
        if !target.owns_table() {
            if !references.is_empty() {
                warn!(
                    "Dropping {} reference(s) to {}: no table of its own",
                    references.len(),
                    target.name
                );
            }
            return Ok(Vec::new());
        }
        let to = target.qualified_name();
        let mut output = Vec::with_capacity(references.len());
        for reference in references {
            let referencing = self.models().get(&reference.model)?;
            if self
                .backend()
                .needs_separate_connection(&referencing.qualified_name(), &to)
            {
                debug!(
                    "Deferring cross-schema reference {}.{} -> {}",
                    reference.model, reference.field, target.name
                );
                state.defer_cross_schema(&target.name, reference);
                continue;
            }
            let field = self.field_of(referencing, &reference.field)?;
            output.push(self.add_foreign_key_sql(referencing, field, target)?);
        }
        Ok(output)
    }

    /// `ALTER TABLE <referencing> ADD CONSTRAINT .. FOREIGN KEY .. REFERENCES <target>`.
    pub fn add_foreign_key_sql(
        &self,
        referencing: &Model,
        field: &Field,
        target: &Model,
    ) -> Result<String> {
        let backend = self.backend();
        let to = target.qualified_name();
        let name = self.foreign_key_constraint_name(referencing, field, target)?;
        let target_column = self.models().target_field(field)?.column();
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}",
            backend.qualified_name_for_ref(&to, &referencing.qualified_name()),
            backend.quote_name(&name),
            backend.quote_name(&field.column()),
            backend.compose(&to),
            backend.quote_name(&target_column),
            backend.deferrable_sql()
        ))
    }

    /// Create one model within a batch.
    ///
    /// Emits the table, then every deferred foreign key that became
    /// creatable: references from this model to tables that already exist,
    /// and references other models left waiting on this one.
    pub fn create_model_statements(
        &self,
        model: &Model,
        state: &mut BatchState,
    ) -> Result<ModelStatements> {
        let create = self.create_table_statements(model, state)?;
        let mut deferred = Vec::new();
        for target_name in state.pending_targets() {
            if state.is_known(&target_name) {
                let target = self.models().get(&target_name)?;
                deferred.extend(self.pending_reference_statements(target, state)?);
            }
        }
        deferred.extend(self.pending_reference_statements(model, state)?);
        state.mark_known(&model.name);
        Ok(ModelStatements { create, deferred })
    }
}
