//! Error types for sheetcmp-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetcmp-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Spreadsheet could not be opened or read
    #[error("failed to read workbook '{path}': {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Requested sheet does not exist in the workbook
    #[error("sheet '{sheet}' not found in '{path}'")]
    SheetNotFound { sheet: String, path: PathBuf },

    /// Source has no header row to take column names from
    #[error("no header row found in '{0}'")]
    EmptyHeader(PathBuf),

    /// File extension is not a known tabular format
    #[error("unsupported file format: '{0}'")]
    UnsupportedFormat(PathBuf),

    /// A table handed to the engine breaks the one-value-per-column invariant
    #[error("reconciliation failed: {message}")]
    Engine { message: String },

    /// Every section offered to the writer was absent or empty
    #[error("no data to write to '{0}'")]
    NoData(PathBuf),

    /// XLSX writer error
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// SQLite error
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn engine(message: impl Into<String>) -> Self {
        Error::Engine {
            message: message.into(),
        }
    }
}
