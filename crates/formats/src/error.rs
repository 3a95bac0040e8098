//! Error types for the properties reader

use thiserror::Error;

/// Properties reader errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed \\uxxxx encoding at line {line}")]
    MalformedEscape { line: usize },

    #[error("Invalid file: {0}")]
    InvalidFile(String),
}

/// Result type alias for format operations
pub type Result<T> = std::result::Result<T, Error>;
