//! Table descriptor cache
//!
//! Descriptors are built on first use of a table and kept for the life of the
//! process. Table names are bounded by the application schema, so there is no
//! eviction.
//!
//! # Lookup protocol
//!
//! ```text
//! get(table) ── hit ──────────────────────────────► descriptor
//!     │
//!    miss
//!     │
//! lock build_lock
//!     │
//! get(table) ── hit (built while we waited) ──────► descriptor
//!     │
//!    miss
//!     │
//! build → insert → unlock ────────────────────────► descriptor
//! ```
//!
//! Reads never take `build_lock`. A descriptor only becomes visible once it is
//! fully built, and at most one successful build runs per table name. A failed
//! build inserts nothing.
//!
//! The key is the table name alone. Callers check the returned descriptor
//! against their own key columns with [`TableDescriptor::matches_key`].

use crate::naming::NamingStrategy;
use crate::template::{build_descriptor, SqlTemplates, TableDescriptor};
use dashmap::DashMap;
use excl_core::Result;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<DescriptorCache>> = Lazy::new(|| Arc::new(DescriptorCache::new()));

/// Table name → descriptor map shared by managers
#[derive(Debug, Default)]
pub struct DescriptorCache {
    descriptors: DashMap<String, Arc<TableDescriptor>>,
    build_lock: Mutex<()>,
}

impl DescriptorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> Arc<DescriptorCache> {
        Arc::clone(&GLOBAL)
    }

    /// Get the descriptor for `table_name`, building it from templates on a miss
    pub fn get_or_create<S: AsRef<str>>(
        &self,
        templates: &SqlTemplates,
        naming: &dyn NamingStrategy,
        table_name: &str,
        version_column_name: &str,
        primary_key_columns: &[S],
    ) -> Result<Arc<TableDescriptor>> {
        self.get_or_create_with(table_name, || {
            build_descriptor(
                templates,
                naming,
                table_name,
                version_column_name,
                primary_key_columns,
            )
        })
    }

    /// Get the descriptor for `table_name`, running `build` on a miss
    ///
    /// `build` succeeds at most once per table name for the life of the
    /// cache, however many threads miss concurrently. Its error is returned
    /// as is and leaves the cache unchanged.
    pub fn get_or_create_with<F>(&self, table_name: &str, build: F) -> Result<Arc<TableDescriptor>>
    where
        F: FnOnce() -> Result<TableDescriptor>,
    {
        if let Some(descriptor) = self.descriptors.get(table_name) {
            return Ok(Arc::clone(descriptor.value()));
        }

        let _guard = self.build_lock.lock();
        if let Some(descriptor) = self.descriptors.get(table_name) {
            return Ok(Arc::clone(descriptor.value()));
        }

        let descriptor = Arc::new(build()?);
        tracing::debug!(
            table = table_name,
            version_column = descriptor.version_column_name(),
            "built exclusive control statements"
        );
        self.descriptors
            .insert(table_name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Check whether a table has been cached
    pub fn contains(&self, table_name: &str) -> bool {
        self.descriptors.contains_key(table_name)
    }

    /// Number of cached tables
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
