//! Two-phase creation of cross-schema foreign keys.
//!
//! Some engines (Oracle) only accept a foreign key into another schema when
//! the statement runs as the referencing table's owner, and only after the
//! target table's owner granted `REFERENCES` to it. A grant cannot be issued
//! to oneself, so a single connection can never do both.
//!
//! The coordinator plans two passes over the cross-schema references left
//! by a DDL batch:
//!
//! 1. **Grants**, grouped by the schema owning each target table
//! 2. **Constraints**, grouped by the schema owning each referencing table
//!
//! Every batch runs on its own short-lived connection opened with only the
//! user swapped. The caller's settings are never modified.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::model::Model;
use crate::core::traits::{Connection, Connector};
use crate::ddl::{DdlGenerator, ReferenceMap};
use crate::error::{DdlError, Result};

/// Statements to run while connected as one schema owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaBatch {
    pub user: String,
    pub statements: Vec<String>,
}

/// Both passes of the cross-schema protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossSchemaPlan {
    pub grants: Vec<SchemaBatch>,
    pub constraints: Vec<SchemaBatch>,
}

impl CrossSchemaPlan {
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.constraints.is_empty()
    }

    /// Batches in execution order: all grants, then all constraints.
    pub fn batches(&self) -> impl Iterator<Item = &SchemaBatch> {
        self.grants.iter().chain(self.constraints.iter())
    }

    /// Listing of every batch, each headed by the identity it runs as.
    pub fn render_as_sql(&self) -> Vec<String> {
        let mut output = Vec::new();
        for batch in self.batches() {
            output.push(format!("-- Connect as user \"{}\"", batch.user));
            output.extend(batch.statements.iter().cloned());
        }
        output
    }
}

/// Plans and runs the cross-schema protocol for one backend.
#[derive(Debug, Clone, Copy)]
pub struct CrossSchemaCoordinator<'a> {
    generator: DdlGenerator<'a>,
}

impl<'a> CrossSchemaCoordinator<'a> {
    pub fn new(generator: DdlGenerator<'a>) -> Self {
        Self { generator }
    }

    /// Owning schema of a model, falling back as far as the backend allows.
    fn owner(&self, model: &Model) -> Result<String> {
        self.generator
            .backend()
            .resolve(&model.qualified_name(), true)
            .schema()
            .map(str::to_string)
            .ok_or_else(|| {
                DdlError::Config(format!(
                    "Cannot determine the schema owning {}",
                    model.name
                ))
            })
    }

    /// Build both passes from the cross-schema references of a batch.
    ///
    /// Batches without statements are left out.
    pub fn plan(&self, cross_schema: &ReferenceMap) -> Result<CrossSchemaPlan> {
        let backend = self.generator.backend();
        let models = self.generator.models();

        let mut grants: IndexMap<String, IndexSet<(String, String)>> = IndexMap::new();
        for (target_name, references) in cross_schema {
            let target = models.get(target_name)?;
            let owner = self.owner(target)?;
            let grantees = grants.entry(owner.clone()).or_default();
            for reference in references {
                let grantee = self.owner(models.get(&reference.model)?)?;
                if grantee != owner {
                    grantees.insert((target.db_table.clone(), grantee));
                }
            }
        }

        let mut constraints: IndexMap<String, Vec<String>> = IndexMap::new();
        for (target_name, references) in cross_schema {
            let target = models.get(target_name)?;
            for reference in references {
                let referencing = models.get(&reference.model)?;
                let field = referencing.get_field(&reference.field).ok_or_else(|| {
                    DdlError::Config(format!(
                        "Model {} has no field {}",
                        referencing.name, reference.field
                    ))
                })?;
                constraints
                    .entry(self.owner(referencing)?)
                    .or_default()
                    .push(self.generator.add_foreign_key_sql(referencing, field, target)?);
            }
        }

        let grants = grants
            .into_iter()
            .map(|(user, grantees)| SchemaBatch {
                user,
                statements: grantees
                    .iter()
                    .filter_map(|(table, grantee)| backend.grant_references_sql(table, grantee))
                    .collect(),
            })
            .filter(|b| !b.statements.is_empty())
            .collect();
        let constraints = constraints
            .into_iter()
            .map(|(user, statements)| SchemaBatch { user, statements })
            .filter(|b| !b.statements.is_empty())
            .collect();

        Ok(CrossSchemaPlan {
            grants,
            constraints,
        })
    }

    /// Run every batch of a plan on its own connection.
    pub async fn execute(
        &self,
        plan: &CrossSchemaPlan,
        connector: &dyn Connector,
        settings: &DatabaseConfig,
    ) -> Result<()> {
        for batch in plan.batches() {
            run_as_user(connector, settings, &batch.user, &batch.statements).await?;
        }
        Ok(())
    }
}

/// Run statements on a connection authenticated as `user`.
///
/// The connection is opened from a copy of `settings` with only the user
/// replaced, and is closed whether or not the statements succeed.
pub async fn run_as_user(
    connector: &dyn Connector,
    settings: &DatabaseConfig,
    user: &str,
    statements: &[String],
) -> Result<()> {
    if statements.is_empty() {
        return Ok(());
    }
    info!(
        "Connecting as user {} to run {} statement(s)",
        user,
        statements.len()
    );
    let scoped = settings.with_user(user);
    let mut conn = connector.connect(&scoped).await?;
    let result = execute_statements(conn.as_mut(), statements).await;
    let closed = conn.close().await;
    result?;
    closed
}

/// Execute statements in order, stopping at the first failure.
pub async fn execute_statements(conn: &mut dyn Connection, statements: &[String]) -> Result<()> {
    for sql in statements {
        debug!("Executing: {}", sql);
        conn.execute(sql, &[]).await.map_err(|e| match e {
            DdlError::Execution { .. } => e,
            other => DdlError::execution(sql.as_str(), other),
        })?;
    }
    Ok(())
}
