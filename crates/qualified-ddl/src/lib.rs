//! # qualified-ddl
//!
//! Schema-qualified table naming and cross-schema DDL generation for MySQL,
//! Oracle, PostgreSQL and SQLite.
//!
//! This library provides:
//!
//! - **Qualified names** resolved against each engine's notion of a schema
//! - **DDL generation** for tables, indexes, deferred foreign keys and drops
//! - **Cross-schema references** created through a two-phase grant protocol
//! - **Introspection** of existing catalogs in terms of qualified names
//!
//! ## Example
//!
//! ```rust,no_run
//! use qualified_ddl::{render_sql, Config, Orchestrator};
//!
//! fn main() -> qualified_ddl::Result<()> {
//!     let config = Config::load("project.yaml")?;
//!     let orchestrator = Orchestrator::from_config(&config, "default")?;
//!     let plan = orchestrator.create_plan()?;
//!     print!("{}", render_sql(&plan.as_sql()));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod orchestrator;

// Re-exports for convenient access
pub use config::{Config, DatabaseConfig, Engine, DEFAULT_DB_ALIAS};
pub use coordinator::{CrossSchemaCoordinator, CrossSchemaPlan, SchemaBatch};
pub use crate::core::{ConnectionRegistry, Field, FieldKind, Model, ModelRegistry, QualifiedName};
pub use ddl::{BatchState, DdlGenerator, PendingReference};
pub use drivers::BackendImpl;
pub use error::{DdlError, Result};
pub use orchestrator::{render_sql, DdlPlan, NameInfo, Orchestrator};
