//! Oracle backend.
//!
//! - [`OracleBackend`]: schema resolution, composition and DDL vocabulary
//! - [`OracleIntrospection`]: catalog readers over the `ALL_*` views
//!
//! # Schemas
//!
//! A schema is a user. Unqualified names resolve to the connection's default
//! schema and, when forced, to the login user. Cross-schema foreign keys are
//! created by the cross-schema coordinator after all tables exist.

mod backend;
mod introspection;

pub use backend::OracleBackend;
pub use introspection::OracleIntrospection;
