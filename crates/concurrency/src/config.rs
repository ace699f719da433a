//! Manager configuration
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! initial_version = "1"
//! optimistic_lock_message_id = "MSG00025"
//!
//! [templates]
//! update = "UPDATE {table} SET {version} = ({version} + 1) WHERE {pk_condition}"
//! ```

use crate::template::SqlTemplates;
use excl_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Version stamp written by `add_version` unless configured otherwise
pub const DEFAULT_INITIAL_VERSION: &str = "1";

/// Policy values of an exclusive control manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Stamp stored for a newly added row
    pub initial_version: String,
    /// Message id attached to optimistic-lock conflicts
    pub optimistic_lock_message_id: Option<String>,
    /// Statement templates
    pub templates: SqlTemplates,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_version: DEFAULT_INITIAL_VERSION.to_string(),
            optimistic_lock_message_id: None,
            templates: SqlTemplates::default(),
        }
    }
}

impl ManagerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ManagerConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.initial_version.trim().is_empty() {
            return Err(Error::Config("initial_version must not be empty".to_string()));
        }
        if let Some(id) = &self.optimistic_lock_message_id {
            if id.trim().is_empty() {
                return Err(Error::Config(
                    "optimistic_lock_message_id must not be blank".to_string(),
                ));
            }
        }
        for (name, template) in self.templates.iter() {
            if !template.contains("{table}") {
                return Err(Error::Config(format!(
                    "template '{}' does not reference {{table}}",
                    name
                )));
            }
        }
        Ok(())
    }
}
