//! SQLite collaborator for exclusive control
//!
//! [`SqliteConnection`] wraps a borrowed [`rusqlite::Connection`] and
//! implements [`excl_core::Connection`], so a manager can run inside the
//! caller's SQLite transaction. A [`rusqlite::Transaction`] derefs to its
//! connection:
//!
//! ```ignore
//! let tx = conn.transaction()?;
//! manager.update_versions_with_check(&SqliteConnection::new(&tx), &versions)?;
//! tx.commit()?;
//! ```
//!
//! Named placeholders (`:user_id`) are native SQLite syntax. Binding a
//! parameter the statement does not reference is a [`Error::Config`] error:
//! it means the templates and the naming strategy disagree.

#![warn(missing_docs)]
#![warn(clippy::all)]

use excl_core::{ColumnValue, Error, NamedParams, PreparedStatement, Result, Row};
use rusqlite::types::{Value, ValueRef};

/// A prepared SQLite statement
pub struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
}

impl<'c> SqliteStatement<'c> {
    /// Prepare `sql` on `conn`
    pub fn prepare(conn: &'c rusqlite::Connection, sql: &str) -> Result<Self> {
        let stmt = conn.prepare(sql).map_err(Error::database)?;
        Ok(Self { stmt })
    }

    fn bind(&mut self, params: &NamedParams) -> Result<()> {
        for (name, value) in params.iter() {
            let placeholder = format!(":{}", name);
            let Some(index) = self
                .stmt
                .parameter_index(&placeholder)
                .map_err(Error::database)?
            else {
                tracing::debug!(placeholder = %placeholder, "parameter not referenced by statement");
                return Err(Error::Config(format!(
                    "statement does not reference parameter [{}]",
                    placeholder
                )));
            };
            self.stmt
                .raw_bind_parameter(index, to_sql_value(value))
                .map_err(Error::database)?;
        }
        Ok(())
    }
}

impl PreparedStatement for SqliteStatement<'_> {
    fn query_rows(&mut self, params: &NamedParams) -> Result<Vec<Row>> {
        self.bind(params)?;
        let names: Vec<String> = self
            .stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = self.stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(Error::database)? {
            let mut result = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = row.get_ref(i).map_err(Error::database)?;
                result.push(name.clone(), value_to_string(value));
            }
            out.push(result);
        }
        Ok(out)
    }

    fn execute_update(&mut self, params: &NamedParams) -> Result<usize> {
        self.bind(params)?;
        self.stmt.raw_execute().map_err(Error::database)
    }
}

/// Borrowed SQLite connection usable as an exclusive-control collaborator
///
/// Build it from a `&rusqlite::Connection` or, through deref, a
/// `&rusqlite::Transaction`. The wrapper never begins or ends transactions.
#[derive(Clone, Copy)]
pub struct SqliteConnection<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> SqliteConnection<'a> {
    /// Wrap `conn`
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The wrapped connection
    pub fn inner(&self) -> &'a rusqlite::Connection {
        self.conn
    }
}

impl<'a> From<&'a rusqlite::Connection> for SqliteConnection<'a> {
    fn from(conn: &'a rusqlite::Connection) -> Self {
        Self::new(conn)
    }
}

impl<'a> From<&'a rusqlite::Transaction<'_>> for SqliteConnection<'a> {
    fn from(tx: &'a rusqlite::Transaction<'_>) -> Self {
        Self::new(tx)
    }
}

impl std::fmt::Debug for SqliteConnection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

impl excl_core::Connection for SqliteConnection<'_> {
    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedStatement + 'c>> {
        Ok(Box::new(SqliteStatement::prepare(self.conn, sql)?))
    }
}

fn to_sql_value(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Null => Value::Null,
        ColumnValue::Int(i) => Value::Integer(*i),
        ColumnValue::Text(s) => Value::Text(s.clone()),
    }
}

fn value_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}
