//! # Exclusive Control
//!
//! Row-level, version-column based concurrency control for relational tables.
//!
//! Every controlled table carries a version column next to its primary key.
//! The manager derives the statements it needs from the table name, the
//! version column and the primary-key columns, so application code never
//! writes table-specific locking SQL.
//!
//! ## Quick Start
//!
//! ```ignore
//! use exclusive_control::prelude::*;
//!
//! let users = TableSchema::new("USER_MST", "VERSION", ["USER_ID"]);
//! let manager = ExclusiveControlManager::new();
//! let tx = SqliteConnection::new(&transaction);
//!
//! // On registration
//! manager.add_version(&tx, &users.context(["u1"])?)?;
//!
//! // Optimistic: remember the version when showing the row...
//! let seen = manager.get_version(&tx, &users.context(["u1"])?)?;
//! // ...and assert it when saving
//! manager.update_versions_with_check(&tx, &[seen.unwrap()])?;
//!
//! // Pessimistic: bump the version before modifying the row
//! manager.update_version(&tx, &users.context(["u1"])?)?;
//! ```
//!
//! ## Layers
//!
//! - [`excl_core`] - row identity, versions, errors, connection traits
//! - [`excl_concurrency`] - statement templates, descriptor cache, manager
//! - `excl_sqlite` (feature `sqlite`) - `SqliteConnection`, the connection
//!   adapter for `rusqlite`

#![warn(missing_docs)]

pub mod prelude;

pub use excl_concurrency::{
    build_descriptor, DescriptorCache, ExclusiveControlManager, ExclusiveControlManagerBuilder,
    ManagerConfig, NamingStrategy, SnakeCaseNaming, SqlTemplates, TableDescriptor,
    DEFAULT_INITIAL_VERSION,
};
pub use excl_core::{
    ColumnValue, Connection, Error, LockMessage, LockingContext, LockingContextBuilder,
    MessageResolver, NamedParams, OptimisticLockError, PreparedStatement, PrimaryKeyValues,
    Result, Row, StaticMessages, TableSchema, Version,
};

/// SQLite connection adapter
#[cfg(feature = "sqlite")]
pub use excl_sqlite as sqlite;
