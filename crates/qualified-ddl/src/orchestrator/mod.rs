//! Batch DDL runs - the main workflow coordinator.
//!
//! An [`Orchestrator`] binds one configured database to a set of models and
//! produces complete plans:
//!
//! - **create**: schemas, tables, deferred foreign keys, indexes and the
//!   cross-schema two-phase listing
//! - **indexes**: `CREATE INDEX` only
//! - **drop**: constraint removal and `DROP TABLE`, in reverse declaration order
//!
//! Plans are plain statement lists. They can be rendered for review or
//! executed against a [`Connection`].

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, DatabaseConfig};
use crate::coordinator::{execute_statements, CrossSchemaCoordinator, CrossSchemaPlan};
use crate::core::catalog::ConnectionRegistry;
use crate::core::model::ModelRegistry;
use crate::core::traits::{Connection, Connector, SchemaBackend};
use crate::ddl::{BatchState, DdlGenerator};
use crate::drivers::BackendImpl;
use crate::error::Result;

/// Orchestrator for one database alias.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    backend: BackendImpl,
    models: ModelRegistry,
}

/// Every statement of a create run, by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DdlPlan {
    /// `CREATE SCHEMA` (or engine equivalent) per schema in use.
    pub schemas: Vec<String>,

    /// `CREATE TABLE` and auto-increment support, in declaration order.
    pub tables: Vec<String>,

    /// `ALTER TABLE .. ADD CONSTRAINT` for references deferred during creation.
    pub deferred: Vec<String>,

    /// `CREATE INDEX` statements.
    pub indexes: Vec<String>,

    /// References that need the two-phase grant and constraint protocol.
    pub cross_schema: CrossSchemaPlan,
}

impl DdlPlan {
    /// Statements run on the caller's connection, in order.
    pub fn local_statements(&self) -> Vec<String> {
        self.schemas
            .iter()
            .chain(&self.tables)
            .chain(&self.deferred)
            .chain(&self.indexes)
            .cloned()
            .collect()
    }

    /// Full listing, cross-schema batches headed by their connection identity.
    pub fn as_sql(&self) -> Vec<String> {
        let mut output = self.local_statements();
        output.extend(self.cross_schema.render_as_sql());
        output
    }
}

/// Resolved naming of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameInfo {
    pub model: String,
    pub schema: Option<String>,
    pub table: String,
    pub composed: String,
}

impl Orchestrator {
    /// Create an orchestrator for a registered database alias.
    pub fn new(registry: &ConnectionRegistry, alias: &str, models: ModelRegistry) -> Result<Self> {
        Ok(Self {
            backend: registry.backend(alias)?,
            models,
        })
    }

    /// Create an orchestrator from a loaded configuration.
    pub fn from_config(config: &Config, alias: &str) -> Result<Self> {
        Self::new(
            &ConnectionRegistry::from_config(config),
            alias,
            config.model_registry()?,
        )
    }

    pub fn backend(&self) -> &BackendImpl {
        &self.backend
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn settings(&self) -> &DatabaseConfig {
        self.backend.settings()
    }

    fn generator(&self) -> DdlGenerator<'_> {
        DdlGenerator::new(&self.backend, &self.models)
    }

    /// Plan a full create run.
    ///
    /// # Errors
    ///
    /// Returns `DdlError::UnresolvedReferences` when a reference targets a
    /// model whose table was never created in this batch.
    pub fn create_plan(&self) -> Result<DdlPlan> {
        let generator = self.generator();
        let mut plan = DdlPlan {
            schemas: generator.create_schema_statements(),
            ..Default::default()
        };

        info!("Planning tables for {} model(s)", self.models.len());
        let mut state = BatchState::new();
        for model in self.models.iter() {
            let statements = generator.create_model_statements(model, &mut state)?;
            plan.tables.extend(statements.create);
            plan.deferred.extend(statements.deferred);
        }
        let cross_schema = state.finish()?;

        plan.indexes = self.index_plan();
        plan.cross_schema = CrossSchemaCoordinator::new(generator).plan(&cross_schema)?;
        if !plan.cross_schema.is_empty() {
            info!(
                "{} cross-schema reference(s) need separate connections",
                cross_schema.values().map(Vec::len).sum::<usize>()
            );
        }
        Ok(plan)
    }

    /// `CREATE INDEX` statements for every model.
    pub fn index_plan(&self) -> Vec<String> {
        let generator = self.generator();
        self.models
            .iter()
            .flat_map(|m| generator.index_statements(m))
            .collect()
    }

    /// Drop statements for every model, last declared first.
    pub fn drop_plan(&self) -> Result<Vec<String>> {
        let generator = self.generator();
        let mut references = generator.references_to_delete()?;
        let mut output = Vec::new();
        for model in self.models.iter().collect::<Vec<_>>().into_iter().rev() {
            output.extend(generator.drop_table_statements(model, &mut references)?);
        }
        Ok(output)
    }

    /// Resolved schema and composed SQL name of a model.
    pub fn describe(&self, model: &str) -> Result<NameInfo> {
        let model = self.models.get(model)?;
        let qname = model.qualified_name();
        let resolved = self.backend.resolve(&qname, false);
        Ok(NameInfo {
            model: model.name.clone(),
            schema: resolved.schema().map(str::to_string),
            table: resolved.table().to_string(),
            composed: self.backend.compose(&qname),
        })
    }

    /// Distinct resolved schemas of the managed models.
    pub fn schemas(&self) -> Vec<String> {
        self.generator().schemas()
    }

    /// Plan and execute a create run.
    ///
    /// Local statements run on `conn`; cross-schema batches each open their
    /// own connection through `connector`.
    pub async fn execute_create(
        &self,
        conn: &mut dyn Connection,
        connector: &dyn Connector,
    ) -> Result<DdlPlan> {
        let plan = self.create_plan()?;
        let local = plan.local_statements();
        info!("Executing {} statement(s)", local.len());
        execute_statements(conn, &local).await?;

        if !plan.cross_schema.is_empty() {
            info!("Creating cross-schema references");
            CrossSchemaCoordinator::new(self.generator())
                .execute(&plan.cross_schema, connector, self.settings())
                .await?;
        }
        Ok(plan)
    }

    /// Plan and execute a drop run on `conn`.
    pub async fn execute_drop(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        let statements = self.drop_plan()?;
        info!("Dropping tables with {} statement(s)", statements.len());
        execute_statements(conn, &statements).await?;
        Ok(statements)
    }

    /// Destroy every schema the models live in.
    ///
    /// Constraint checking is disabled for the duration and re-enabled
    /// afterwards, also when a statement fails.
    pub async fn destroy_schemas(&self, conn: &mut dyn Connection) -> Result<Vec<String>> {
        let statements = self.generator().destroy_schema_statements();
        if statements.is_empty() {
            warn!("{} has no statement to destroy schemas", self.backend.name());
            return Ok(statements);
        }
        let disabled = conn.disable_constraint_checking().await?;
        let result = execute_statements(conn, &statements).await;
        let restored = if disabled {
            conn.enable_constraint_checking().await
        } else {
            Ok(())
        };
        result?;
        restored?;
        Ok(statements)
    }
}

/// Render statements as a script, one per entry.
///
/// Statements are terminated with `;` unless they are comments or already
/// carry their own terminator.
pub fn render_sql(statements: &[String]) -> String {
    let mut output = String::new();
    for statement in statements {
        output.push_str(statement);
        if !(statement.starts_with("--") || statement.ends_with(';') || statement.ends_with('/')) {
            output.push(';');
        }
        output.push('\n');
    }
    output
}
