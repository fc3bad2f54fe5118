// file: src/config/loader.rs
// version: 2.0.0
// guid: d26ea6c9-a5e6-4eb8-a95f-3d75b6348283

//! Node configuration file loading and environment variable substitution

use super::NodeConfigBuilder;
use crate::{InstallerError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Loads unattended node configuration files (JSON, YAML or TOML)
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load node configuration input; the format is chosen by file extension
    pub fn load_node_input<P: AsRef<Path>>(&self, path: P) -> Result<NodeConfigBuilder> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            InstallerError::config(format!(
                "Failed to read node config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let input: NodeConfigBuilder = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&expanded)?,
            "toml" => toml::from_str(&expanded)?,
            "json" | "" => serde_json::from_str(&expanded).map_err(|e| {
                InstallerError::config(format!("Invalid JSON in {}: {}", path.display(), e))
            })?,
            other => {
                return Err(InstallerError::config(format!(
                    "Unsupported node config format '.{}' (use json, yaml or toml)",
                    other
                )))
            }
        };

        Ok(input)
    }

    /// Expand `${VAR}` references in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| InstallerError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(InstallerError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
