//! Error types for the order splitting pipeline.
//!
//! - [`CsvError`] - Reading and writing tabular files
//! - [`FieldError`] - A single field that does not have the expected shape
//! - [`ConfigError`] - Invalid runtime settings
//! - [`PipelineError`] - Top-level errors returned by a transform run
//! - [`ServerError`] - Upload handling errors
//!
//! Conversions are provided via `From` so `?` works across layers.
//! Unresolved costs are not errors; see [`crate::models::Cost`].

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a tabular file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file bytes could not be decoded.
    #[error("Failed to decode file: {0}")]
    EncodingError(String),

    /// Malformed CSV content, or a failed CSV write.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No header line.
    #[error("CSV file is empty")]
    EmptyFile,

    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

// =============================================================================
// Field Errors
// =============================================================================

/// A text field that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// Item title without a `[...]` item code.
    #[error("Item title has no bracketed item code: '{0}'")]
    MalformedTitle(String),

    /// Currency field without a `0.00` style amount.
    #[error("'{field}' has no decimal amount: '{value}'")]
    MalformedAmount { field: &'static str, value: String },

    /// Quantity that is not a non-negative integer.
    #[error("Quantity is not a whole number: '{0}'")]
    MalformedQuantity(String),

    /// Running quantity total no longer fits.
    #[error("Quantity total overflows when adding '{0}'")]
    QuantityOverflow(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Errors that abort a transform run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the order export or cost table, or writing an output.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A row with a field that cannot be interpreted.
    #[error("Line {line}: {source}")]
    Field {
        line: u64,
        #[source]
        source: FieldError,
    },

    /// The input path has no file name to derive output names from.
    #[error("Cannot derive output file names from '{0}'")]
    InvalidPath(String),
}

impl PipelineError {
    /// Attach the source line of the offending row.
    pub fn at_line(line: u64, source: FieldError) -> Self {
        Self::Field { line, source }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// Upload handling errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The transform failed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Missing or unreadable upload.
    #[error("{0}")]
    BadRequest(String),

    /// Extension not in the allow-list.
    #[error("File type not supported")]
    UnsupportedFile,

    /// Storage or worker failure.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for field parsing.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
