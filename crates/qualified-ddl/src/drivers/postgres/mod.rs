//! PostgreSQL backend.
//!
//! This module provides PostgreSQL-specific implementations:
//!
//! - [`PostgresBackend`]: schema resolution, composition and DDL vocabulary
//! - [`PostgresIntrospection`]: catalog readers over `pg_catalog`

mod backend;
mod introspection;

pub use backend::PostgresBackend;
pub use introspection::PostgresIntrospection;
