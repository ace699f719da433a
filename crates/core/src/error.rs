//! Error types for exclusive control
//!
//! Two failures carry domain meaning:
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | `OptimisticLock` | `check_versions`, `update_versions_with_check` | one or more rows no longer carry the asserted version |
//! | `InvalidState` | `update_version`, `remove_version` | the addressed row does not exist |
//!
//! Everything else is a malformed request, a configuration problem, or a
//! failure reported by the connection collaborator.

use crate::message::LockMessage;
use crate::value::NamedParams;
use crate::version::Version;
use std::fmt;
use thiserror::Error;

/// Result type for exclusive-control operations
pub type Result<T> = std::result::Result<T, Error>;

/// All exclusive-control errors
#[derive(Debug, Error)]
pub enum Error {
    /// Version conflict on one or more rows
    #[error(transparent)]
    OptimisticLock(#[from] OptimisticLockError),

    /// Target row of a pessimistic update or removal is absent
    #[error("version was not found. sql = [{sql}], params = [{params}]")]
    InvalidState {
        /// Statement that was executed
        sql: String,
        /// Values bound to it
        params: NamedParams,
    },

    /// Locking context or version is malformed
    #[error("invalid locking context: {0}")]
    InvalidContext(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the connection collaborator
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a collaborator error
    pub fn database(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Database(Box::new(e))
    }

    /// Check if this is an optimistic-lock conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::OptimisticLock(_))
    }

    /// Check if this error is retryable
    ///
    /// Conflicts may succeed after the caller re-reads current versions.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Check if the addressed row was missing
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }

    /// Borrow the conflict details, if this is a conflict
    pub fn as_optimistic_lock(&self) -> Option<&OptimisticLockError> {
        match self {
            Error::OptimisticLock(e) => Some(e),
            _ => None,
        }
    }
}

/// Aggregate conflict raised after a whole batch has been evaluated
///
/// `failures` preserves the order in which versions were submitted. It is never
/// empty: a batch without stale rows succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisticLockError {
    failures: Vec<Version>,
    message: Option<LockMessage>,
}

impl OptimisticLockError {
    /// Create a conflict from the stale versions of a batch
    ///
    /// Returns `None` when `failures` is empty: a batch without stale rows is
    /// not a conflict.
    pub fn new(failures: Vec<Version>, message: Option<LockMessage>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        Some(Self { failures, message })
    }

    /// Versions that failed the check, in submission order
    pub fn failures(&self) -> &[Version] {
        &self.failures
    }

    /// Consume the error, yielding the failed versions
    pub fn into_failures(self) -> Vec<Version> {
        self.failures
    }

    /// User-facing message, when one was configured
    pub fn message(&self) -> Option<&LockMessage> {
        self.message.as_ref()
    }
}

impl fmt::Display for OptimisticLockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "optimistic lock failed: {} version(s) in conflict",
            self.failures.len()
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for OptimisticLockError {}
