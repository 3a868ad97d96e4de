use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Why a file could not be turned into a vehicle table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("file is empty or has no data rows")]
    Empty,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),

    #[error("line {line}, column {column}: '{value}' is not a valid {expected}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("parquet: {0}")]
    Parquet(#[from] ParquetError),
}

/// The input was not valid UTF-8.
#[derive(Debug, Error)]
#[error("file is not valid UTF-8 (invalid byte at offset {offset})")]
pub struct EncodingError {
    pub offset: usize,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("arrow: {0}")]
    Arrow(#[from] ArrowError),
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
