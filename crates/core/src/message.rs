//! User-facing conflict messages
//!
//! Message text lives outside this crate. A [`MessageResolver`] turns the
//! configured message id into text for the current user; the id alone is used
//! when nothing resolves it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Resolved message attached to an optimistic-lock conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMessage {
    /// Message id as configured on the manager
    pub id: String,
    /// Human-readable text
    pub text: String,
}

impl LockMessage {
    /// Create a message
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LockMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Message lookup collaborator
pub trait MessageResolver: Send + Sync {
    /// Text for `message_id`, or `None` when unknown
    fn resolve(&self, message_id: &str) -> Option<String>;
}

/// Fixed id → text table
#[derive(Debug, Clone, Default)]
pub struct StaticMessages {
    messages: HashMap<String, String>,
}

impl StaticMessages {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(id.into(), text.into());
        self
    }
}

impl MessageResolver for StaticMessages {
    fn resolve(&self, message_id: &str) -> Option<String> {
        self.messages.get(message_id).cloned()
    }
}
