//! Readers for properties-style input files
//!
//! This crate provides a streaming reader for Java-style `.properties`
//! files, with transparent gzip decompression.

pub mod entry;
pub mod error;
pub mod properties;

pub use entry::PropertyEntry;
pub use error::{Error, Result};
pub use properties::{parse_str, read_text, PropertiesReader};
