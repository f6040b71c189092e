use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, reconciles, or emits client data.
///
/// Individual cell reads never produce an error: malformed or missing cells
/// resolve to typed defaults. Only structural problems with a whole source,
/// output failures, and per-record persistence failures surface here.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the CSV writer fails.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation, typically a
    /// workbook that cannot be opened at all.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet the source requires is absent from the workbook.
    #[error("missing sheet '{sheet}' in {origin} workbook")]
    MissingSheet { origin: String, sheet: String },

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a file name does not identify one of the known sources.
    #[error("cannot determine source version from file name '{0}'")]
    UnrecognizedSource(String),

    /// Raised by a persistence sink when a single document cannot be written.
    #[error("failed to persist document {key}: {reason}")]
    Persistence { key: String, reason: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
