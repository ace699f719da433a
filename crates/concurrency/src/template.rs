//! Statement templates and table descriptors
//!
//! A [`TableDescriptor`] holds the six statements exclusive control needs for
//! one table. They are derived from the table name, version column and ordered
//! primary-key columns by substituting into [`SqlTemplates`]:
//!
//! | Token | Substituted with |
//! |-------|------------------|
//! | `{table}` | table name |
//! | `{version}` | version column |
//! | `{pk_condition}` | `PK1 = :pk1 AND PK2 = :pk2 ...` |
//! | `{version_condition}` | `VERSION = :version` |
//! | `{columns}` | `PK1, PK2, ..., VERSION` |
//! | `{values}` | `:pk1, :pk2, ..., :version` |

use crate::naming::NamingStrategy;
use excl_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// The six statement templates
///
/// Each field can be replaced on its own; `Default` yields the standard shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlTemplates {
    /// Read the current version
    pub select: String,
    /// Read the version only if it still matches
    pub select_and_check: String,
    /// Create the version row
    pub insert: String,
    /// Unconditionally increment the version
    pub update: String,
    /// Increment the version only if it still matches
    pub update_and_check: String,
    /// Remove the version row
    pub delete: String,
}

impl Default for SqlTemplates {
    fn default() -> Self {
        Self {
            select: "SELECT {version} FROM {table} WHERE {pk_condition}".to_string(),
            select_and_check:
                "SELECT {version} FROM {table} WHERE {pk_condition} AND {version_condition}"
                    .to_string(),
            insert: "INSERT INTO {table} ({columns}) VALUES ({values})".to_string(),
            update: "UPDATE {table} SET {version} = ({version} + 1) WHERE {pk_condition}"
                .to_string(),
            update_and_check:
                "UPDATE {table} SET {version} = ({version} + 1) WHERE {pk_condition} AND {version_condition}"
                    .to_string(),
            delete: "DELETE FROM {table} WHERE {pk_condition}".to_string(),
        }
    }
}

impl SqlTemplates {
    /// Templates as `(field name, template)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("select", self.select.as_str()),
            ("select_and_check", self.select_and_check.as_str()),
            ("insert", self.insert.as_str()),
            ("update", self.update.as_str()),
            ("update_and_check", self.update_and_check.as_str()),
            ("delete", self.delete.as_str()),
        ]
        .into_iter()
    }
}

/// Generated statements for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    version_column_name: String,
    version_placeholder: String,
    primary_key_columns: Vec<String>,
    select_sql: String,
    select_and_check_sql: String,
    insert_sql: String,
    update_sql: String,
    update_and_check_sql: String,
    delete_sql: String,
}

impl TableDescriptor {
    /// Version column name
    pub fn version_column_name(&self) -> &str {
        &self.version_column_name
    }

    /// Placeholder the version value binds to
    pub fn version_placeholder(&self) -> &str {
        &self.version_placeholder
    }

    /// Primary-key columns the statements were built for, in order
    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key_columns
    }

    /// Check whether the statements address exactly this version column and
    /// key column set (case-insensitive, any order)
    pub fn matches_key<S: AsRef<str>>(
        &self,
        version_column_name: &str,
        primary_key_columns: &[S],
    ) -> bool {
        self.version_column_name
            .eq_ignore_ascii_case(version_column_name)
            && self.primary_key_columns.len() == primary_key_columns.len()
            && primary_key_columns.iter().all(|column| {
                self.primary_key_columns
                    .iter()
                    .any(|own| own.eq_ignore_ascii_case(column.as_ref()))
            })
    }

    /// `SELECT` of the current version
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// `SELECT` asserting the version
    pub fn select_and_check_sql(&self) -> &str {
        &self.select_and_check_sql
    }

    /// `INSERT` of a new version row
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// Unconditional increment
    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    /// Increment asserting the version
    pub fn update_and_check_sql(&self) -> &str {
        &self.update_and_check_sql
    }

    /// `DELETE` of the version row
    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

/// Build the descriptor for a table
///
/// Pure string substitution; column order in the output follows
/// `primary_key_columns`. Fails with [`Error::InvalidContext`] when two
/// columns map to the same placeholder, or a column maps to an empty one.
pub fn build_descriptor<S: AsRef<str>>(
    templates: &SqlTemplates,
    naming: &dyn NamingStrategy,
    table_name: &str,
    version_column_name: &str,
    primary_key_columns: &[S],
) -> Result<TableDescriptor> {
    let version_placeholder = naming.placeholder(version_column_name);
    check_placeholders(
        naming,
        table_name,
        version_column_name,
        &version_placeholder,
        primary_key_columns,
    )?;

    let pk_condition = primary_key_columns
        .iter()
        .map(|c| format!("{} = :{}", c.as_ref(), naming.placeholder(c.as_ref())))
        .collect::<Vec<_>>()
        .join(" AND ");
    let version_condition = format!("{} = :{}", version_column_name, version_placeholder);

    let columns = primary_key_columns
        .iter()
        .map(|c| c.as_ref())
        .chain(std::iter::once(version_column_name))
        .collect::<Vec<_>>()
        .join(", ");
    let values = primary_key_columns
        .iter()
        .map(|c| format!(":{}", naming.placeholder(c.as_ref())))
        .chain(std::iter::once(format!(":{}", version_placeholder)))
        .collect::<Vec<_>>()
        .join(", ");

    let render = |template: &str| {
        template
            .replace("{table}", table_name)
            .replace("{version_condition}", &version_condition)
            .replace("{pk_condition}", &pk_condition)
            .replace("{columns}", &columns)
            .replace("{values}", &values)
            .replace("{version}", version_column_name)
    };

    Ok(TableDescriptor {
        version_column_name: version_column_name.to_string(),
        primary_key_columns: primary_key_columns
            .iter()
            .map(|c| c.as_ref().to_string())
            .collect(),
        select_sql: render(&templates.select),
        select_and_check_sql: render(&templates.select_and_check),
        insert_sql: render(&templates.insert),
        update_sql: render(&templates.update),
        update_and_check_sql: render(&templates.update_and_check),
        delete_sql: render(&templates.delete),
        version_placeholder,
    })
}

fn check_placeholders<S: AsRef<str>>(
    naming: &dyn NamingStrategy,
    table_name: &str,
    version_column_name: &str,
    version_placeholder: &str,
    primary_key_columns: &[S],
) -> Result<()> {
    let mut seen: Vec<(&str, String)> = Vec::with_capacity(primary_key_columns.len() + 1);
    let columns = primary_key_columns
        .iter()
        .map(|c| (c.as_ref(), naming.placeholder(c.as_ref())))
        .chain(std::iter::once((
            version_column_name,
            version_placeholder.to_string(),
        )));

    for (column, placeholder) in columns {
        if placeholder.is_empty() {
            return Err(Error::InvalidContext(format!(
                "column [{}] of table [{}] has no usable placeholder name",
                column, table_name
            )));
        }
        if let Some((other, _)) = seen.iter().find(|(_, p)| *p == placeholder) {
            return Err(Error::InvalidContext(format!(
                "columns [{}] and [{}] of table [{}] both bind to [:{}]",
                other, column, table_name, placeholder
            )));
        }
        seen.push((column, placeholder));
    }
    Ok(())
}
