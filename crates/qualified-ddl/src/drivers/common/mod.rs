//! Helpers shared across engine backends.
//!
//! - [`resolve_with_fallback`]: resolver shape for engines with a guaranteed schema
//! - [`placeholders`]: bind-parameter lists for catalog queries
//! - [`column_index`]: checked conversion of catalog column positions

use crate::core::qname::QualifiedName;
use crate::error::{DdlError, Result};

/// Resolve `name` using `convert` for the declared schema and `fallback`
/// when a schema is forced but none could be derived.
///
/// Already-resolved names pass through unless `force_schema` demands a
/// schema that is still missing.
pub fn resolve_with_fallback<F>(
    name: &QualifiedName,
    force_schema: bool,
    convert: F,
    fallback: &str,
) -> QualifiedName
where
    F: Fn(Option<&str>) -> Option<String>,
{
    if name.is_resolved() && (name.schema().is_some() || !force_schema) {
        return name.clone();
    }
    let mut schema = convert(name.schema());
    if schema.is_none() && force_schema && !fallback.is_empty() {
        schema = Some(fallback.to_string());
    }
    name.clone().into_resolved(schema)
}

/// Comma-separated placeholders for `count` parameters starting at `start`.
pub fn placeholders<F>(count: usize, start: usize, placeholder: F) -> String
where
    F: Fn(usize) -> String,
{
    (start..start + count)
        .map(placeholder)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 0-based column index from a catalog position counted from `base`.
pub fn column_index(position: i64, base: i64) -> Result<usize> {
    position
        .checked_sub(base)
        .and_then(|idx| usize::try_from(idx).ok())
        .ok_or_else(|| DdlError::Decode(format!("invalid column position {}", position)))
}
