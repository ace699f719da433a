//! Exclusive control manager
//!
//! Orchestrates version-column based concurrency control over application
//! tables. Each operation resolves the table's statements from the
//! [`DescriptorCache`], binds primary-key (and version) values, and runs the
//! statement on the caller's connection.
//!
//! ## Optimistic locking
//!
//! ```text
//! read:   get_version(ctx)                 → Version { version: "3" }
//! ...user edits...
//! commit: update_versions_with_check([v])  → VERSION = 4, or OptimisticLock
//! ```
//!
//! `check_versions` asserts without modifying; `update_versions_with_check`
//! asserts and increments in one statement. Both evaluate every version before
//! reporting, so the caller learns the full conflict set at once.
//!
//! ## Pessimistic locking
//!
//! `update_version` increments unconditionally. The row lock taken by the
//! `UPDATE` serializes concurrent writers until the caller's transaction ends.
//!
//! The manager never begins, commits, or rolls back transactions.

use crate::cache::DescriptorCache;
use crate::config::ManagerConfig;
use crate::naming::{NamingStrategy, SnakeCaseNaming};
use crate::template::{SqlTemplates, TableDescriptor};
use excl_core::{
    check_identifier, ColumnValue, Connection, Error, LockMessage, LockingContext,
    MessageResolver, NamedParams, OptimisticLockError, PrimaryKeyValues, Result, Version,
};
use std::fmt;
use std::sync::Arc;

/// Statement run for each element of a checked batch
#[derive(Debug, Clone, Copy)]
enum BatchCheck {
    /// `select_and_check`; an empty result is a conflict
    Select,
    /// `update_and_check`; zero affected rows is a conflict
    Update,
}

/// Version-based exclusive control over arbitrary tables
///
/// Cheap to share: all state is immutable after construction except the
/// descriptor cache, which is safe for concurrent use.
pub struct ExclusiveControlManager {
    config: ManagerConfig,
    naming: Arc<dyn NamingStrategy>,
    cache: Arc<DescriptorCache>,
    messages: Option<Arc<dyn MessageResolver>>,
}

impl ExclusiveControlManager {
    /// Create a manager with default policy and the process-wide cache
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            naming: Arc::new(SnakeCaseNaming),
            cache: DescriptorCache::global(),
            messages: None,
        }
    }

    /// Create a builder for manager configuration
    pub fn builder() -> ExclusiveControlManagerBuilder {
        ExclusiveControlManagerBuilder::new()
    }

    /// Create a manager from a validated configuration
    pub fn from_config(config: ManagerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Cache this manager resolves statements from
    pub fn cache(&self) -> &Arc<DescriptorCache> {
        &self.cache
    }

    /// Read the current version of the row addressed by `context`
    ///
    /// Returns `Ok(None)` when no such row exists. A row whose version column
    /// is NULL is an [`Error::InvalidState`].
    pub fn get_version(
        &self,
        conn: &dyn Connection,
        context: &LockingContext,
    ) -> Result<Option<Version>> {
        let descriptor = self.descriptor_for_context(context)?;
        let sql = descriptor.select_sql();
        let params = self.bind_primary_keys(context.primary_keys());

        tracing::debug!(table = context.table_name(), sql, "reading version");
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_rows(&params)?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        match row.get_string(descriptor.version_column_name()) {
            Some(version) => Ok(Some(Version::from_context(context, version))),
            None => Err(Error::InvalidState {
                sql: sql.to_string(),
                params,
            }),
        }
    }

    /// Assert that every version is still current, without modifying rows
    ///
    /// Fails with [`Error::OptimisticLock`] listing every stale version in
    /// input order.
    pub fn check_versions(&self, conn: &dyn Connection, versions: &[Version]) -> Result<()> {
        self.check_batch(conn, versions, BatchCheck::Select)
    }

    /// Assert that every version is still current and increment it
    ///
    /// Rows that pass are left at `version + 1`. Fails with
    /// [`Error::OptimisticLock`] listing every stale version in input order;
    /// rolling back the increments that did succeed is the caller's job.
    pub fn update_versions_with_check(
        &self,
        conn: &dyn Connection,
        versions: &[Version],
    ) -> Result<()> {
        self.check_batch(conn, versions, BatchCheck::Update)
    }

    /// Increment the version of the addressed row unconditionally
    ///
    /// Fails with [`Error::InvalidState`] unless exactly one row was updated.
    pub fn update_version(&self, conn: &dyn Connection, context: &LockingContext) -> Result<()> {
        let descriptor = self.descriptor_for_context(context)?;
        let params = self.bind_primary_keys(context.primary_keys());
        self.execute_exactly_one(conn, context.table_name(), descriptor.update_sql(), params)
    }

    /// Insert the version row for `context` with the initial version
    pub fn add_version(&self, conn: &dyn Connection, context: &LockingContext) -> Result<()> {
        let descriptor = self.descriptor_for_context(context)?;
        let sql = descriptor.insert_sql();
        let mut params = self.bind_primary_keys(context.primary_keys());
        params.bind(
            descriptor.version_placeholder(),
            ColumnValue::from_version_text(&self.config.initial_version),
        );

        tracing::debug!(table = context.table_name(), sql, "adding version");
        let mut stmt = conn.prepare(sql)?;
        stmt.execute_update(&params)?;
        Ok(())
    }

    /// Delete the version row of `context`
    ///
    /// Fails with [`Error::InvalidState`] unless exactly one row was deleted.
    pub fn remove_version(&self, conn: &dyn Connection, context: &LockingContext) -> Result<()> {
        let descriptor = self.descriptor_for_context(context)?;
        let params = self.bind_primary_keys(context.primary_keys());
        self.execute_exactly_one(conn, context.table_name(), descriptor.delete_sql(), params)
    }

    fn check_batch(
        &self,
        conn: &dyn Connection,
        versions: &[Version],
        check: BatchCheck,
    ) -> Result<()> {
        // Resolve every descriptor first so malformed input runs nothing
        let descriptors = versions
            .iter()
            .map(|version| self.descriptor_for_version(version))
            .collect::<Result<Vec<_>>>()?;

        let mut failures = Vec::new();
        for (version, descriptor) in versions.iter().zip(&descriptors) {
            let mut params = self.bind_primary_keys(version.primary_keys());
            params.bind(
                descriptor.version_placeholder(),
                ColumnValue::from_version_text(version.version()),
            );

            let current = match check {
                BatchCheck::Select => {
                    let sql = descriptor.select_and_check_sql();
                    tracing::debug!(table = version.table_name(), sql, "checking version");
                    let mut stmt = conn.prepare(sql)?;
                    !stmt.query_rows(&params)?.is_empty()
                }
                BatchCheck::Update => {
                    let sql = descriptor.update_and_check_sql();
                    tracing::debug!(table = version.table_name(), sql, "updating version with check");
                    let mut stmt = conn.prepare(sql)?;
                    stmt.execute_update(&params)? != 0
                }
            };

            if !current {
                failures.push(version.clone());
            }
        }

        let Some(conflict) = OptimisticLockError::new(failures, self.conflict_message()) else {
            return Ok(());
        };
        tracing::warn!(
            failures = conflict.failures().len(),
            total = versions.len(),
            "optimistic lock conflict"
        );
        Err(conflict.into())
    }

    fn execute_exactly_one(
        &self,
        conn: &dyn Connection,
        table_name: &str,
        sql: &str,
        params: NamedParams,
    ) -> Result<()> {
        tracing::debug!(table = table_name, sql, "executing version statement");
        let mut stmt = conn.prepare(sql)?;
        let count = stmt.execute_update(&params)?;
        if count != 1 {
            return Err(Error::InvalidState {
                sql: sql.to_string(),
                params,
            });
        }
        Ok(())
    }

    fn conflict_message(&self) -> Option<LockMessage> {
        let id = self.config.optimistic_lock_message_id.as_deref()?;
        let text = self
            .messages
            .as_ref()
            .and_then(|resolver| resolver.resolve(id))
            .unwrap_or_else(|| id.to_string());
        Some(LockMessage::new(id, text))
    }

    fn bind_primary_keys(&self, primary_keys: &PrimaryKeyValues) -> NamedParams {
        let mut params = NamedParams::new();
        for (column, value) in primary_keys.iter() {
            params.bind(self.naming.placeholder(column), value.clone());
        }
        params
    }

    fn descriptor_for_context(&self, context: &LockingContext) -> Result<Arc<TableDescriptor>> {
        let columns: Vec<&str> = context.primary_key_columns().collect();
        self.descriptor(context.table_name(), context.version_column_name(), &columns)
    }

    fn descriptor_for_version(&self, version: &Version) -> Result<Arc<TableDescriptor>> {
        let columns: Vec<&str> = version.primary_keys().columns().collect();
        self.descriptor(version.table_name(), version.version_column_name(), &columns)
    }

    fn descriptor(
        &self,
        table_name: &str,
        version_column_name: &str,
        primary_key_columns: &[&str],
    ) -> Result<Arc<TableDescriptor>> {
        check_identifier("table name", table_name)?;
        check_identifier("version column", version_column_name)?;
        if primary_key_columns.is_empty() {
            return Err(Error::InvalidContext(format!(
                "table [{}] has no primary key columns",
                table_name
            )));
        }
        for column in primary_key_columns {
            check_identifier("primary key column", column)?;
        }
        let descriptor = self.cache.get_or_create(
            &self.config.templates,
            self.naming.as_ref(),
            table_name,
            version_column_name,
            primary_key_columns,
        )?;
        if !descriptor.matches_key(version_column_name, primary_key_columns) {
            return Err(Error::InvalidContext(format!(
                "table [{}] is registered with version column [{}] and primary key [{}], got [{}] and [{}]",
                table_name,
                descriptor.version_column_name(),
                descriptor.primary_key_columns().join(", "),
                version_column_name,
                primary_key_columns.join(", ")
            )));
        }
        Ok(descriptor)
    }
}

impl Default for ExclusiveControlManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExclusiveControlManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveControlManager")
            .field("config", &self.config)
            .field("cached_tables", &self.cache.len())
            .field("has_message_resolver", &self.messages.is_some())
            .finish()
    }
}

/// Builder for [`ExclusiveControlManager`]
///
/// # Example
///
/// ```ignore
/// let manager = ExclusiveControlManager::builder()
///     .optimistic_lock_message_id("MSG00025")
///     .message_resolver(messages)
///     .build()?;
/// ```
pub struct ExclusiveControlManagerBuilder {
    config: ManagerConfig,
    naming: Arc<dyn NamingStrategy>,
    custom_naming: bool,
    cache: Option<Arc<DescriptorCache>>,
    messages: Option<Arc<dyn MessageResolver>>,
}

impl ExclusiveControlManagerBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            naming: Arc::new(SnakeCaseNaming),
            custom_naming: false,
            cache: None,
            messages: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the stamp stored by `add_version`
    pub fn initial_version(mut self, version: impl Into<String>) -> Self {
        self.config.initial_version = version.into();
        self
    }

    /// Attach a message id to optimistic-lock conflicts
    pub fn optimistic_lock_message_id(mut self, id: impl Into<String>) -> Self {
        self.config.optimistic_lock_message_id = Some(id.into());
        self
    }

    /// Replace the statement templates
    pub fn templates(mut self, templates: SqlTemplates) -> Self {
        self.config.templates = templates;
        self
    }

    /// Replace the placeholder naming strategy
    pub fn naming(mut self, naming: impl NamingStrategy + 'static) -> Self {
        self.naming = Arc::new(naming);
        self.custom_naming = true;
        self
    }

    /// Use `cache` instead of the default one
    ///
    /// The cache is keyed by table name only, so every manager sharing it must
    /// use the same templates and naming.
    pub fn cache(mut self, cache: Arc<DescriptorCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve message ids to user-facing text
    pub fn message_resolver(mut self, resolver: impl MessageResolver + 'static) -> Self {
        self.messages = Some(Arc::new(resolver));
        self
    }

    /// Validate the configuration and build the manager
    ///
    /// Without an explicit [`cache`](Self::cache), a manager on the default
    /// templates and naming uses the process-wide cache; any other policy gets
    /// a private one.
    pub fn build(self) -> Result<ExclusiveControlManager> {
        self.config.validate()?;
        let default_policy =
            !self.custom_naming && self.config.templates == SqlTemplates::default();
        let cache = match self.cache {
            Some(cache) => cache,
            None if default_policy => DescriptorCache::global(),
            None => {
                tracing::debug!("custom statement policy, using a private descriptor cache");
                Arc::new(DescriptorCache::new())
            }
        };
        Ok(ExclusiveControlManager {
            config: self.config,
            naming: self.naming,
            cache,
            messages: self.messages,
        })
    }
}

impl Default for ExclusiveControlManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
