//! Core types for exclusive control
//!
//! This crate defines the row-identity and version types shared by every layer:
//! - [`TableSchema`] / [`LockingContext`]: which row, in which table
//! - [`Version`]: a row identity plus its version stamp
//! - [`Error`] / [`OptimisticLockError`]: the failure taxonomy
//! - [`Connection`] / [`PreparedStatement`]: the collaborator that runs SQL

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod message;
pub mod traits;
pub mod value;
pub mod version;

pub use context::{check_identifier, LockingContext, LockingContextBuilder, TableSchema};
pub use error::{Error, OptimisticLockError, Result};
pub use message::{LockMessage, MessageResolver, StaticMessages};
pub use traits::{Connection, PreparedStatement, Row};
pub use value::{ColumnValue, NamedParams, PrimaryKeyValues};
pub use version::Version;
