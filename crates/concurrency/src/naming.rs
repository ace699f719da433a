//! Column name → placeholder name conversion
//!
//! The same column must always produce the same placeholder: the template
//! builder writes `COLUMN = :placeholder` into the SQL and the manager binds
//! values under that name.

/// Maps column names to bind-placeholder identifiers
pub trait NamingStrategy: Send + Sync {
    /// Placeholder (without the leading `:`) for `column`
    fn placeholder(&self, column: &str) -> String;
}

/// Lowercase snake-case placeholders
///
/// - ASCII letters are lowercased
/// - every run of other characters becomes a single `_`
/// - separators at either end are dropped
/// - a leading digit gets a `_` prefix
///
/// `USER_ID` → `user_id`, `Pk-2` → `pk_2`, `1ST.KEY` → `_1st_key`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseNaming;

impl NamingStrategy for SnakeCaseNaming {
    fn placeholder(&self, column: &str) -> String {
        let mut out = String::with_capacity(column.len() + 1);
        let mut pending_separator = false;
        for c in column.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !out.is_empty() {
                    out.push('_');
                }
                pending_separator = false;
                if out.is_empty() && c.is_ascii_digit() {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                pending_separator = true;
            }
        }
        out
    }
}
