//! MySQL/MariaDB backend.
//!
//! This module provides MySQL-specific implementations for:
//! - [`MysqlBackend`]: schema resolution, composition and DDL vocabulary
//! - [`MysqlIntrospection`]: catalog readers
//!
//! # Schemas
//!
//! A MySQL "schema" is a database. Unqualified names resolve to the
//! connection's default schema, and forced resolution falls back to the
//! configured database name. Foreign keys are never declared inline.

mod backend;
mod introspection;

pub use backend::MysqlBackend;
pub use introspection::MysqlIntrospection;
