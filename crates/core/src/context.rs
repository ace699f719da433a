//! Locking contexts: which row of which table is under control
//!
//! A [`TableSchema`] is declared once per controlled table and stamps out
//! [`LockingContext`]s for individual rows:
//!
//! ```
//! use excl_core::TableSchema;
//!
//! let users = TableSchema::new("USER_MST", "VERSION", ["USER_ID", "PK2", "PK3"]);
//! let ctx = users.context(["uid001", "pk2001", "pk3001"]).unwrap();
//! assert_eq!(ctx.primary_keys().to_string(), "USER_ID=uid001, PK2=pk2001, PK3=pk3001");
//! ```

use crate::error::{Error, Result};
use crate::value::{ColumnValue, PrimaryKeyValues};
use serde::{Deserialize, Serialize};

/// Check that `name` can be spliced into SQL as a bare identifier
///
/// Accepts ASCII alphanumerics, `_`, `$` and `.` (for schema-qualified names).
pub fn check_identifier(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidContext(format!("{} must not be empty", kind)));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if !valid {
        return Err(Error::InvalidContext(format!(
            "{} [{}] is not a plain SQL identifier",
            kind, name
        )));
    }
    Ok(())
}

/// Declared shape of a controlled table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    table_name: String,
    version_column_name: String,
    primary_key_columns: Vec<String>,
}

impl TableSchema {
    /// Declare a table with its version column and ordered primary-key columns
    pub fn new<I, S>(
        table_name: impl Into<String>,
        version_column_name: impl Into<String>,
        primary_key_columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            version_column_name: version_column_name.into(),
            primary_key_columns: primary_key_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Version column name
    pub fn version_column_name(&self) -> &str {
        &self.version_column_name
    }

    /// Primary-key columns in declaration order
    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key_columns
    }

    /// Build the context for one row
    ///
    /// `values` are matched to the declared primary-key columns by position.
    pub fn context<I, V>(&self, values: I) -> Result<LockingContext>
    where
        I: IntoIterator<Item = V>,
        V: Into<ColumnValue>,
    {
        let values: Vec<ColumnValue> = values.into_iter().map(Into::into).collect();
        if values.len() != self.primary_key_columns.len() {
            return Err(Error::InvalidContext(format!(
                "table [{}] declares {} primary key column(s) but {} value(s) were given",
                self.table_name,
                self.primary_key_columns.len(),
                values.len()
            )));
        }
        let mut builder = LockingContext::builder(self.table_name.clone())
            .version_column(self.version_column_name.clone());
        for (column, value) in self.primary_key_columns.iter().zip(values) {
            builder = builder.primary_key(column.clone(), value);
        }
        builder.build()
    }
}

/// Identity of one row subject to exclusive control
///
/// The primary-key mapping always holds exactly the declared key columns.
/// Contexts are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockingContext {
    table_name: String,
    version_column_name: String,
    primary_keys: PrimaryKeyValues,
}

impl LockingContext {
    /// Start building a context for `table_name`
    pub fn builder(table_name: impl Into<String>) -> LockingContextBuilder {
        LockingContextBuilder::new(table_name)
    }

    /// Table name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Version column name
    pub fn version_column_name(&self) -> &str {
        &self.version_column_name
    }

    /// Primary-key columns in declaration order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.primary_keys.columns()
    }

    /// Primary-key values
    pub fn primary_keys(&self) -> &PrimaryKeyValues {
        &self.primary_keys
    }
}

/// Builder for [`LockingContext`]
#[derive(Debug, Clone)]
pub struct LockingContextBuilder {
    table_name: String,
    version_column_name: Option<String>,
    primary_keys: Vec<(String, ColumnValue)>,
}

impl LockingContextBuilder {
    /// Create a builder for `table_name`
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            version_column_name: None,
            primary_keys: Vec::new(),
        }
    }

    /// Set the version column name
    pub fn version_column(mut self, name: impl Into<String>) -> Self {
        self.version_column_name = Some(name.into());
        self
    }

    /// Append the next primary-key column and its value
    pub fn primary_key(mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.primary_keys.push((column.into(), value.into()));
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<LockingContext> {
        check_identifier("table name", &self.table_name)?;
        let version_column_name = self.version_column_name.ok_or_else(|| {
            Error::InvalidContext(format!(
                "table [{}] has no version column",
                self.table_name
            ))
        })?;
        check_identifier("version column", &version_column_name)?;
        if self.primary_keys.is_empty() {
            return Err(Error::InvalidContext(format!(
                "table [{}] has no primary key columns",
                self.table_name
            )));
        }

        let mut primary_keys = PrimaryKeyValues::new();
        for (column, value) in self.primary_keys {
            check_identifier("primary key column", &column)?;
            if primary_keys.contains(&column) {
                return Err(Error::InvalidContext(format!(
                    "primary key column [{}] of table [{}] is declared twice",
                    column, self.table_name
                )));
            }
            if column.eq_ignore_ascii_case(&version_column_name) {
                return Err(Error::InvalidContext(format!(
                    "version column [{}] of table [{}] cannot be part of the primary key",
                    column, self.table_name
                )));
            }
            primary_keys.insert(column, value);
        }

        Ok(LockingContext {
            table_name: self.table_name,
            version_column_name,
            primary_keys,
        })
    }
}
