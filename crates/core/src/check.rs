//! Duplicated property check
//!
//! Feeds the entries of one properties file through a
//! [`DuplicateKeyTracker`] and turns the resulting snapshot into one
//! [`Violation`] per duplicated key, in duplication order.

use crate::unique_properties::DuplicateKeyTracker;
use crate::{Error, Result};
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name used to tag every violation this check emits
pub const CHECK_NAME: &str = "UniqueProperties";

/// Severity attached to reported violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rendered as `ERROR`
    #[default]
    Error,
    /// Rendered as `WARN`
    Warning,
    /// Rendered as `INFO`
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        f.write_str(label)
    }
}

/// Settings for [`UniquePropertiesCheck`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    /// File extensions to check, without leading dot
    pub file_extensions: Vec<String>,
    /// Severity of reported violations
    pub severity: Severity,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            file_extensions: vec!["properties".to_string()],
            severity: Severity::Error,
        }
    }
}

impl CheckSettings {
    /// Build settings, normalizing extensions to lowercase without a dot
    pub fn new<I, S>(file_extensions: I, severity: Severity) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let file_extensions: Vec<String> = file_extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if file_extensions.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one file extension is required".to_string(),
            ));
        }

        Ok(Self {
            file_extensions,
            severity,
        })
    }

    /// Whether `path` has one of the configured extensions.
    ///
    /// A trailing `.gz` is ignored, so `messages.properties.gz` matches
    /// `properties`.
    pub fn accepts(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => return false,
        };
        let name = name.strip_suffix(".gz").unwrap_or(&name);

        self.file_extensions
            .iter()
            .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{}", ext)))
    }
}

/// What a violation reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A key assigned more than once
    DuplicateProperty { key: String, occurrences: usize },
    /// The file could not be read or parsed
    UnableToOpen { cause: String },
}

/// A single diagnostic tied to a file and line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    /// Human readable message, without location
    pub fn message(&self) -> String {
        match &self.kind {
            ViolationKind::DuplicateProperty { key, occurrences } => {
                format!("Duplicated property '{}' ({} occurrence(s)).", key, occurrences)
            }
            ViolationKind::UnableToOpen { cause } => {
                format!("Unable to open '{}': {}.", self.path.display(), cause)
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}:{}: {} [{}]",
            self.severity,
            self.path.display(),
            self.line,
            self.message(),
            CHECK_NAME
        )
    }
}

/// Reports keys that occur more than once in a properties file
#[derive(Debug, Clone, Default)]
pub struct UniquePropertiesCheck {
    settings: CheckSettings,
}

impl UniquePropertiesCheck {
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CheckSettings {
        &self.settings
    }

    /// Check one file's entries.
    ///
    /// `entries` are (key, value, line) triples in file order. Each
    /// duplicate is reported at the line its key was first defined on.
    pub fn process<I, K, V>(&self, path: &Path, entries: I) -> Result<Vec<Violation>>
    where
        I: IntoIterator<Item = (K, V, usize)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tracker = DuplicateKeyTracker::new();
        let mut first_lines: AHashMap<String, usize> = AHashMap::new();
        for (key, value, line) in entries {
            let key = key.into();
            if !first_lines.contains_key(&key) {
                first_lines.insert(key.clone(), line);
            }
            tracker.assign(key, value);
        }

        self.report(path, &tracker, |key| Ok(first_lines.get(key).copied().unwrap_or(1)))
    }

    /// Check (key, value) pairs that carry no line information.
    ///
    /// The line of each duplicated key is searched for in `file_text`,
    /// falling back to line 1 when no line matches.
    pub fn process_unlocated<I, K, V>(
        &self,
        path: &Path,
        file_text: &str,
        entries: I,
    ) -> Result<Vec<Violation>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tracker = DuplicateKeyTracker::new();
        for (key, value) in entries {
            tracker.assign(key, value);
        }

        let lines: Vec<&str> = file_text.trim_start_matches('\u{feff}').lines().collect();
        self.report(path, &tracker, |key| line_number(&lines, key))
    }

    fn report<F>(&self, path: &Path, tracker: &DuplicateKeyTracker, mut locate: F) -> Result<Vec<Violation>>
    where
        F: FnMut(&str) -> Result<usize>,
    {
        let stats = tracker.stats();
        debug!(
            "{}: {} assignments, {} distinct keys, {} duplicated",
            path.display(),
            stats.assignments,
            stats.distinct_keys,
            stats.duplicated_keys
        );

        let mut violations = Vec::new();
        for duplicate in tracker.duplicates() {
            let line = locate(&duplicate.key)?;
            violations.push(Violation {
                path: path.to_path_buf(),
                line,
                severity: self.settings.severity,
                kind: ViolationKind::DuplicateProperty {
                    occurrences: duplicate.occurrences(),
                    key: duplicate.key,
                },
            });
        }

        if !violations.is_empty() {
            info!("{}: {} duplicated key(s)", path.display(), violations.len());
        }

        Ok(violations)
    }

    /// Violation for a file that could not be loaded
    pub fn unable_to_open(&self, path: &Path, cause: impl fmt::Display) -> Violation {
        Violation {
            path: path.to_path_buf(),
            line: 1,
            severity: self.settings.severity,
            kind: ViolationKind::UnableToOpen {
                cause: cause.to_string(),
            },
        }
    }
}

/// Pattern matching a line that defines `key`.
///
/// Spaces inside the key are written escaped (`\ `) in the file, and the key
/// must be followed by a separator or the end of the line.
fn key_pattern(key: &str) -> Result<Regex> {
    let escaped = key
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\\ ");
    Ok(Regex::new(&format!(r"^\s*{}(?:[\s:=]|$)", escaped))?)
}

/// 1-based line of the first definition of `key`, or 1 if none is found
fn line_number(lines: &[&str], key: &str) -> Result<usize> {
    let pattern = key_pattern(key)?;
    Ok(lines
        .iter()
        .position(|line| pattern.is_match(line))
        .map_or(1, |index| index + 1))
}
