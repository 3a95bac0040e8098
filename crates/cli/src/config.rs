//! Configuration file support for the duplicate key check

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uniqprops_core::{CheckSettings, Severity};

/// Complete check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// File extensions to check
    #[serde(default = "default_extensions")]
    pub file_extensions: Vec<String>,
    /// Severity attached to every violation
    #[serde(default)]
    pub severity: Severity,
    /// Exit with a failure status when any violation is found
    #[serde(default)]
    pub fail_on_violation: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["properties".to_string()]
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            file_extensions: default_extensions(),
            severity: Severity::default(),
            fail_on_violation: false,
        }
    }
}

impl CheckConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            _ => Err(anyhow::anyhow!(
                "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                extension
            )),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let content = match extension {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "toml" => toml::to_string_pretty(self)?,
            _ => {
                return Err(anyhow::anyhow!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                    extension
                ))
            }
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate and convert into check settings
    pub fn to_settings(&self) -> Result<CheckSettings> {
        CheckSettings::new(&self.file_extensions, self.severity)
            .context("Invalid check configuration")
    }
}
