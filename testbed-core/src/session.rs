//! Provisioning session identifiers

use std::fmt;
use uuid::Uuid;

/// Identifier attached to the log span of one provisioning session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new session ID
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid.simple().to_string()[..12].to_uppercase())
    }

    /// Create a session ID with a specific value (for testing)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
