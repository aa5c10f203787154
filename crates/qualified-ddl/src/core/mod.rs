//! Core abstractions for schema-qualified naming.
//!
//! This module provides the foundational types and traits used throughout
//! the crate:
//!
//! - [`qname`]: Schema-qualified table names
//! - [`identifier`]: Identifier validation, quoting, digests and truncation
//! - [`model`]: Model and field metadata consumed by DDL generation
//! - [`value`]: Values and rows exchanged with a connection
//! - [`traits`]: Backend, connection and introspection capabilities
//! - [`catalog`]: Connection registry for dependency injection
//!
//! # Architecture
//!
//! The core module defines engine-agnostic abstractions that are implemented
//! by driver modules (`drivers/mysql`, `drivers/oracle`, etc.). DDL
//! generation depends only on [`traits::SchemaBackend`].

pub mod catalog;
pub mod identifier;
pub mod model;
pub mod qname;
pub mod traits;
pub mod value;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types for convenience
pub use catalog::ConnectionRegistry;
pub use model::{Field, FieldKind, Model, ModelRegistry};
pub use qname::QualifiedName;
pub use traits::{
    ColumnInfo, Connection, Connector, IndexInfo, Introspection, KeyColumn, Relation,
    SchemaBackend,
};
pub use value::{Row, Value};
