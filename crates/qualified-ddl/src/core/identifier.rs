//! Identifier validation, quoting, digests and length truncation.
//!
//! SQL identifiers cannot be bound as statement parameters, so every table,
//! column, index and constraint name that ends up in generated DDL passes
//! through one of the quoting functions below. Generated names (indexes,
//! foreign key constraints) additionally carry a short digest so that two
//! different inputs stay distinct even after being cut down to the backend's
//! identifier limit.

use sha2::{Digest, Sha256};

use crate::error::{DdlError, Result};

/// Upper bound accepted for declared identifiers before any backend limit applies.
const MAX_DECLARED_IDENTIFIER_LENGTH: usize = 128;

/// Validate a declared identifier (table, column, schema).
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding the declared-name limit
///
/// # Errors
///
/// Returns `DdlError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DdlError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DdlError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_DECLARED_IDENTIFIER_LENGTH {
        return Err(DdlError::Config(format!(
            "Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_DECLARED_IDENTIFIER_LENGTH,
            name.chars().count(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier with ANSI double quotes (PostgreSQL, Oracle, SQLite).
///
/// ```ignore
/// assert_eq!(quote_double("users"), "\"users\"");
/// assert_eq!(quote_double("table\"name"), "\"table\"\"name\"");
/// ```
pub fn quote_double(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        return name.to_string();
    }
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a MySQL identifier using backticks.
///
/// ```ignore
/// assert_eq!(quote_backtick("users"), "`users`");
/// assert_eq!(quote_backtick("table`name"), "`table``name`");
/// ```
pub fn quote_backtick(name: &str) -> String {
    if name.len() >= 2 && name.starts_with('`') && name.ends_with('`') {
        return name.to_string();
    }
    format!("`{}`", name.replace('`', "``"))
}

/// 32-bit digest of a tuple of name components, rendered as lowercase hex.
///
/// The digest is a pure function of its arguments: the components are joined
/// with a NUL separator (so `("ab", "c")` and `("a", "bc")` differ), hashed with
/// SHA-256, and the first four bytes are read as a big-endian `u32`.
pub fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    let bytes = hasher.finalize();
    let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    format!("{:x}", value)
}

/// Cut `name` down to at most `max_len` characters.
///
/// Names within bounds are returned unchanged. Longer names keep as much of
/// their head as fits and end in `_<digest of the full name>`, so two long
/// names sharing a prefix still differ after truncation.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let hash = digest(&[name]);
    let suffix_len = hash.len() + 1;
    if max_len <= suffix_len {
        return hash.chars().take(max_len).collect();
    }
    let head: String = name.chars().take(max_len - suffix_len).collect();
    format!("{}_{}", head, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_DECLARED_IDENTIFIER_LENGTH + 1);
        let result = validate_identifier(&long_name);
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_quote_double_escapes_quote() {
        assert_eq!(quote_double("users"), "\"users\"");
        assert_eq!(quote_double("table\"name"), "\"table\"\"name\"");
    }

    #[test]
    fn test_quote_double_is_idempotent() {
        assert_eq!(quote_double("\"users\""), "\"users\"");
    }

    #[test]
    fn test_quote_backtick_escapes_backtick() {
        assert_eq!(quote_backtick("users"), "`users`");
        assert_eq!(quote_backtick("a`b"), "`a``b`");
        assert_eq!(quote_backtick("`users`"), "`users`");
    }

    // =========================================================================
    // Digest tests
    // =========================================================================

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest(&["sn", "sn"]), digest(&["sn", "sn"]));
        assert_eq!(digest(&["txt"]), digest(&["txt"]));
    }

    #[test]
    fn test_digest_separates_components() {
        assert_ne!(digest(&["ab", "c"]), digest(&["a", "bc"]));
        assert_ne!(digest(&["a", "b"]), digest(&["b", "a"]));
    }

    #[test]
    fn test_digest_is_lowercase_hex_u32() {
        let d = digest(&["some_table", "other_table"]);
        assert!(!d.is_empty() && d.len() <= 8);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(u32::from_str_radix(&d, 16).is_ok());
    }

    // =========================================================================
    // Truncation tests
    // =========================================================================

    #[test]
    fn test_truncate_identity_within_bounds() {
        assert_eq!(truncate_name("short_1a2b", 64), "short_1a2b");
        assert_eq!(truncate_name("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_ends_with_digest_of_full_name() {
        let name = format!("{}_{}", "x".repeat(100), digest(&["col"]));
        let cut = truncate_name(&name, 30);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with(&format!("_{}", digest(&[name.as_str()]))));
    }

    #[test]
    fn test_truncate_shared_prefix_stays_distinct() {
        let suffix = digest(&["created_at"]);
        let a = truncate_name(&format!("customer_address_history_{}", suffix), 30);
        let b = truncate_name(&format!("customer_address_history_old_{}", suffix), 30);
        assert_eq!(a.chars().count(), 30);
        assert_eq!(b.chars().count(), 30);
        assert_ne!(a, b);

        let a = truncate_name(&format!("{}one", "n".repeat(40)), 30);
        let b = truncate_name(&format!("{}two", "n".repeat(40)), 30);
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncate_to_tiny_limit() {
        let cut = truncate_name(&"z".repeat(40), 4);
        assert!(cut.chars().count() <= 4);
    }

    #[test]
    fn test_truncate_is_char_boundary_safe() {
        let name = format!("{}_{}", "é".repeat(50), digest(&["c"]));
        let cut = truncate_name(&name, 20);
        assert_eq!(cut.chars().count(), 20);
    }
}
