//! Error types for duplicate key checking

use thiserror::Error;

/// Core check errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
