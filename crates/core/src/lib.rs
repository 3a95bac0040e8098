//! Core duplicate key tracking for properties files
//!
//! This crate provides the order-preserving duplicate key tracker and the
//! check that turns its findings into diagnostics.

pub mod check;
pub mod error;
pub mod unique_properties;

pub use check::{CheckSettings, Severity, UniquePropertiesCheck, Violation, ViolationKind};
pub use error::{Error, Result};
pub use unique_properties::{DuplicateEntry, DuplicateKeyTracker, DuplicateSnapshot, TrackerStats};
