//! Qualified (schema, table) names.
//!
//! A [`QualifiedName`] is read unresolved from model metadata, passed through a
//! backend's resolver (which returns a new, resolved value) and finally
//! composed into quoted SQL text. Values are never mutated in place.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{DdlError, Result};

/// A possibly schema-qualified relation name.
///
/// Equality and hashing consider only `(schema, table)`. The resolved flag and
/// the originating model are carried along for the resolver and for
/// diagnostics, and two names that differ only in those compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawQualifiedName")]
pub struct QualifiedName {
    schema: Option<String>,
    table: String,
    #[serde(default)]
    resolved: bool,
    #[serde(skip)]
    model: Option<String>,
}

/// Wire shape of a name; converted through [`QualifiedName::new`].
#[derive(Deserialize)]
struct RawQualifiedName {
    schema: Option<String>,
    table: String,
    #[serde(default)]
    resolved: bool,
}

impl TryFrom<RawQualifiedName> for QualifiedName {
    type Error = DdlError;

    fn try_from(raw: RawQualifiedName) -> Result<Self> {
        let mut name = Self::new(raw.schema.as_deref(), &raw.table)?;
        name.resolved = raw.resolved;
        Ok(name)
    }
}

impl QualifiedName {
    /// Create an unresolved name.
    ///
    /// # Errors
    ///
    /// Returns `DdlError::Config` if `table` is empty.
    pub fn new(schema: Option<&str>, table: &str) -> Result<Self> {
        if table.is_empty() {
            return Err(DdlError::Config(
                "Qualified name requires a non-empty table".to_string(),
            ));
        }
        Ok(Self::from_parts(
            schema.map(str::to_string),
            table.to_string(),
            false,
        ))
    }

    /// Create a name whose schema is already in the backend's canonical form.
    ///
    /// # Errors
    ///
    /// Returns `DdlError::Config` if `table` is empty.
    pub fn resolved(schema: Option<&str>, table: &str) -> Result<Self> {
        let mut name = Self::new(schema, table)?;
        name.resolved = true;
        Ok(name)
    }

    /// Construct without validating `table`; callers guarantee it is non-empty.
    pub(crate) fn from_parts(schema: Option<String>, table: String, resolved: bool) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()),
            table,
            resolved,
            model: None,
        }
    }

    /// Attach the label of the model this name was derived from.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Schema component, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Table component.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the schema is already in canonical, queryable form.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Label of the originating model, if known.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// New resolved name with the given schema, keeping the table and model.
    pub fn into_resolved(self, schema: Option<String>) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()),
            table: self.table,
            resolved: true,
            model: self.model,
        }
    }

    /// New name with a different table, keeping schema, flag and model.
    pub fn with_table(&self, table: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            table: table.into(),
            resolved: self.resolved,
            model: self.model.clone(),
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.table == other.table
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
        self.table.hash(state);
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}
