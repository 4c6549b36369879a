//! Backing service families

use crate::error::UnknownServiceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A backing service family that can be provisioned for a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ServiceKind {
    /// RabbitMQ
    MessageBroker,
    /// Redis
    Cache,
    /// MongoDB
    DocumentStore,
    /// Cassandra
    WideColumnStore,
}

impl ServiceKind {
    /// Every supported kind
    pub const ALL: [ServiceKind; 4] = [
        Self::MessageBroker,
        Self::Cache,
        Self::DocumentStore,
        Self::WideColumnStore,
    ];

    /// Canonical name, used for instance naming and logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageBroker => "rabbitmq",
            Self::Cache => "redis",
            Self::DocumentStore => "mongodb",
            Self::WideColumnStore => "cassandra",
        }
    }

    /// Generic family name
    pub fn family(&self) -> &'static str {
        match self {
            Self::MessageBroker => "message-broker",
            Self::Cache => "cache",
            Self::DocumentStore => "document-store",
            Self::WideColumnStore => "wide-column-store",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKind {
    type Err = UnknownServiceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.family() == wanted)
            .ok_or_else(|| UnknownServiceKind(s.to_string()))
    }
}

impl TryFrom<String> for ServiceKind {
    type Error = UnknownServiceKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceKind> for &'static str {
    fn from(kind: ServiceKind) -> Self {
        kind.name()
    }
}
