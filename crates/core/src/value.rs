//! Value types bound into exclusive-control statements
//!
//! - [`ColumnValue`]: a single primary-key or version value
//! - [`PrimaryKeyValues`]: ordered column-name → value mapping of a row identity
//! - [`NamedParams`]: ordered placeholder-name → value mapping handed to a connection
//!
//! Both maps keep insertion order. Primary keys are declared in a fixed order per
//! table and the generated SQL lists them in that order, so order is part of the
//! contract rather than an accident of hashing.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A value bound to a named placeholder
///
/// Only the shapes primary keys and version counters take in practice are
/// modelled. Anything richer belongs to the application's own statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnValue {
    /// SQL NULL
    Null,
    /// 64-bit signed integer
    Int(i64),
    /// UTF-8 text
    Text(String),
}

impl ColumnValue {
    /// Bind form of a textual version stamp
    ///
    /// Integral stamps bind as [`ColumnValue::Int`] so they compare natively
    /// against numeric version columns. Anything else (timestamps, opaque
    /// tokens) binds as text.
    pub fn from_version_text(version: &str) -> Self {
        match version.trim().parse::<i64>() {
            Ok(n) => ColumnValue::Int(n),
            Err(_) => ColumnValue::Text(version.to_string()),
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// Try to get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => f.write_str("null"),
            ColumnValue::Int(i) => write!(f, "{}", i),
            ColumnValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(s: &str) -> Self {
        ColumnValue::Text(s.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(s: String) -> Self {
        ColumnValue::Text(s)
    }
}

impl From<&String> for ColumnValue {
    fn from(s: &String) -> Self {
        ColumnValue::Text(s.clone())
    }
}

impl From<i64> for ColumnValue {
    fn from(i: i64) -> Self {
        ColumnValue::Int(i)
    }
}

impl From<i32> for ColumnValue {
    fn from(i: i32) -> Self {
        ColumnValue::Int(i64::from(i))
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ColumnValue::Null, Into::into)
    }
}

/// Inline capacity for key maps; composite keys rarely exceed four columns.
type Entries = SmallVec<[(String, ColumnValue); 4]>;

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &Entries) -> fmt::Result {
    for (i, (name, value)) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", name, value)?;
    }
    Ok(())
}

/// Ordered primary-key column values of one row
///
/// Keys are column names as declared by the table schema. Lookups ignore
/// ASCII case because SQL column names do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKeyValues {
    entries: Entries,
}

impl PrimaryKeyValues {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value, replacing an existing entry for the same column
    ///
    /// Replacing keeps the column at its original position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<ColumnValue>) {
        let column = column.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&column))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Get the value for a column
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Check whether a column is present
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Column names in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(column, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of key columns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for PrimaryKeyValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, &self.entries)
    }
}

impl<K, V> FromIterator<(K, V)> for PrimaryKeyValues
where
    K: Into<String>,
    V: Into<ColumnValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = PrimaryKeyValues::new();
        for (column, value) in iter {
            values.insert(column, value);
        }
        values
    }
}

/// Ordered named parameters for a prepared statement
///
/// Names are placeholder identifiers without the leading `:`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedParams {
    entries: Entries,
}

impl NamedParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, replacing an existing binding of the same name
    pub fn bind(&mut self, name: impl Into<String>, value: ColumnValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get a bound value by placeholder name
    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Iterate `(name, value)` pairs in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for NamedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, &self.entries)
    }
}
