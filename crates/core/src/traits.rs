//! Connection collaborator interface
//!
//! Exclusive control never opens, commits, or rolls back transactions. The
//! caller hands in a [`Connection`] already bound to its transaction; every
//! statement runs there.

use crate::error::Result;
use crate::value::NamedParams;

/// One result row, column values rendered as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.columns.push((name.into(), value));
    }

    /// Text of `column`; `None` when the column is absent or NULL
    ///
    /// Column names compare case-insensitively.
    pub fn get_string(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A statement prepared on a [`Connection`]
///
/// Parameters use `:name` placeholders; `params` carries names without the colon.
pub trait PreparedStatement {
    /// Run a query and collect its rows
    fn query_rows(&mut self, params: &NamedParams) -> Result<Vec<Row>>;

    /// Run a data-modifying statement and return the affected-row count
    fn execute_update(&mut self, params: &NamedParams) -> Result<usize>;
}

/// Transaction-scoped connection
pub trait Connection {
    /// Prepare `sql` for execution in the current transaction
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>> {
        (**self).prepare(sql)
    }
}
