//! Error types for the import library.

use thiserror::Error;

/// Main error type for import operations.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No registry entry exists for a source file kind.
    #[error("Unknown table kind '{0}'")]
    UnknownTableKind(String),

    /// A catalog column has a shape the mapper dispatch cannot bind.
    #[error("Unexpected SQL type for column {column}: {message}")]
    UnexpectedSqlType { column: String, message: String },

    /// A decoded value does not fit the column it is bound to.
    #[error("Column {column} expects {expected}, got {found}")]
    ValueKindMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric payload does not fit the destination integer width.
    #[error("Value {value} out of range for column {column} ({target})")]
    NumericOutOfRange {
        column: String,
        value: String,
        target: &'static str,
    },

    /// A BEGINTIJD-style timestamp could not be parsed.
    #[error("Invalid timestamp {value:?} for column {column}: {message}")]
    InvalidTimestamp {
        column: String,
        value: String,
        message: String,
    },

    /// A catalog column is absent from the source file.
    #[error("Field {0} not present in source file")]
    MissingField(String),

    /// Malformed dBase header or record.
    #[error("dBase format error: {0}")]
    Dbf(String),

    /// Target database connection or query error
    #[error("Target database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// The source directory contains nothing to import.
    #[error("No .dbf files found in {0}")]
    NoSourceFiles(String),

    /// Failure while converting a specific record.
    #[error("Record {ordinal}: {source}")]
    Record {
        ordinal: u64,
        #[source]
        source: Box<ImportError>,
    },

    /// Failure while importing a specific file.
    #[error("Import failed for {path}: {source}")]
    File {
        path: String,
        #[source]
        source: Box<ImportError>,
    },

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

impl ImportError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        ImportError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Attach the 1-based record ordinal to a conversion error.
    pub fn record(ordinal: u64, source: ImportError) -> Self {
        ImportError::Record {
            ordinal,
            source: Box::new(source),
        }
    }

    /// Attach the source file path to an error.
    pub fn file(path: impl Into<String>, source: ImportError) -> Self {
        ImportError::File {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn mismatch(
        column: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        ImportError::ValueKindMismatch {
            column: column.into(),
            expected,
            found,
        }
    }

    /// Process exit code for this error.
    ///
    /// Usage and configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            ImportError::Config(_) | ImportError::Yaml(_) | ImportError::NoSourceFiles(_) => 2,
            _ => 1,
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

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;
