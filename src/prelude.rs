//! Convenient imports for exclusive control.
//!
//! ```ignore
//! use exclusive_control::prelude::*;
//!
//! let manager = ExclusiveControlManager::new();
//! manager.check_versions(&SqliteConnection::new(&tx), &versions)?;
//! ```

// Main entry point
pub use crate::{ExclusiveControlManager, ExclusiveControlManagerBuilder, ManagerConfig};

// Error handling
pub use crate::{Error, OptimisticLockError, Result};

// Row identity
pub use crate::{ColumnValue, LockingContext, PrimaryKeyValues, TableSchema, Version};

// Collaborators
pub use crate::{Connection, MessageResolver, StaticMessages};

#[cfg(feature = "sqlite")]
pub use excl_sqlite::SqliteConnection;
