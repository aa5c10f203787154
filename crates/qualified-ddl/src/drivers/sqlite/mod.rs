//! SQLite backend.
//!
//! SQLite has no schemas, so they are emulated by prefixing the table name
//! with the resolved schema (`<schema>_<table>`). Catalog introspection is
//! not implemented; every [`Introspection`] operation reports
//! [`DdlError::Unsupported`](crate::error::DdlError::Unsupported).

mod backend;

pub use backend::SqliteBackend;

use crate::core::traits::Introspection;

/// SQLite introspection: all operations unsupported.
#[derive(Debug, Clone, Default)]
pub struct SqliteIntrospection;

impl Introspection for SqliteIntrospection {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
