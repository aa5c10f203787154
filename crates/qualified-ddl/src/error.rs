//! Error types for qualified naming and DDL generation.

use thiserror::Error;

/// Main error type for DDL generation and execution.
#[derive(Error, Debug)]
pub enum DdlError {
    /// Configuration error (invalid YAML, missing fields, unresolvable schema, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend does not implement the requested operation.
    ///
    /// Callers may substitute an empty result instead of aborting.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: String,
        operation: String,
    },

    /// A statement failed while being executed.
    #[error("Statement failed: {message}\n  Statement: {statement}")]
    Execution { statement: String, message: String },

    /// Deferred foreign keys were left over after the batch was declared complete.
    #[error("Unresolved pending references after batch completion: {}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),

    /// A relation or lookup named a model that is not registered.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A catalog query returned rows of an unexpected shape.
    #[error("Unexpected result row: {0}")]
    Decode(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DdlError {
    /// Create an Unsupported error for a backend operation.
    pub fn unsupported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        DdlError::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    /// Create an Execution error carrying the offending statement.
    pub fn execution(statement: impl Into<String>, message: impl std::fmt::Display) -> Self {
        DdlError::Execution {
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is the unsupported-operation signal.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DdlError::Unsupported { .. })
    }

    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            DdlError::Config(_) | DdlError::Yaml(_) | DdlError::UnknownModel(_) => 2,
            DdlError::Unsupported { .. } => 3,
            DdlError::Execution { .. } => 4,
            DdlError::UnresolvedReferences(_) => 5,
            DdlError::Decode(_) | DdlError::Io(_) | DdlError::Json(_) => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for DDL operations.
pub type Result<T> = std::result::Result<T, DdlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_distinct_from_execution() {
        let err = DdlError::unsupported("sqlite", "get_relations");
        assert!(err.is_unsupported());
        assert_eq!(err.exit_code(), 3);

        let err = DdlError::execution("DROP TABLE \"t\"", "relation does not exist");
        assert!(!err.is_unsupported());
        assert!(err.to_string().contains("DROP TABLE \"t\""));
    }

    #[test]
    fn test_unresolved_references_lists_models() {
        let err = DdlError::UnresolvedReferences(vec!["app.A -> app.B".into()]);
        assert!(err.to_string().contains("app.A -> app.B"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_format_detailed_includes_message() {
        let err = DdlError::Config("database 'default' is not configured".into());
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Configuration error"));
    }
}
