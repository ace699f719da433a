//! Version snapshots
//!
//! A [`Version`] pairs a row identity with a version stamp, either read from the
//! database by `get_version` or supplied by the caller as the stamp it expects
//! to still be current. The stamp is kept as text whatever the column type.

use crate::context::LockingContext;
use crate::value::PrimaryKeyValues;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identity plus observed or asserted version stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    table_name: String,
    version_column_name: String,
    primary_keys: PrimaryKeyValues,
    version: String,
}

impl Version {
    /// Create a version from its parts
    pub fn new(
        table_name: impl Into<String>,
        version_column_name: impl Into<String>,
        primary_keys: PrimaryKeyValues,
        version: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            version_column_name: version_column_name.into(),
            primary_keys,
            version: version.into(),
        }
    }

    /// Create a version for the row addressed by `context`
    pub fn from_context(context: &LockingContext, version: impl Into<String>) -> Self {
        Self::new(
            context.table_name(),
            context.version_column_name(),
            context.primary_keys().clone(),
            version,
        )
    }

    /// Table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Version column name
    pub fn version_column_name(&self) -> &str {
        &self.version_column_name
    }

    /// Primary-key values of the row
    pub fn primary_keys(&self) -> &PrimaryKeyValues {
        &self.primary_keys
    }

    /// Version stamp in textual form
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table_name = [{}], version = [{}], primary_keys = [{}]",
            self.table_name, self.version, self.primary_keys
        )
    }
}
