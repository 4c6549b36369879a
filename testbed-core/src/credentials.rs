//! Connection credentials for a provisioned service instance

use crate::error::CredentialsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys that are part of the address and never stored as attributes
const RESERVED_KEYS: [&str; 3] = ["host", "hostname", "port"];

/// Host, port and auxiliary attributes for one provisioned service.
///
/// Credentials are immutable once built: the provisioning client creates them
/// and everything downstream only reads them. The port is validated at
/// construction, so a `Credentials` value always has a usable address.
///
/// Serialized as a flat object, e.g.
/// `{"host":"localhost","port":5672,"username":"guest"}`. Deserialization
/// accepts the port as a number or a numeric string, and `hostname` in place
/// of `host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
    host: String,
    port: u16,
    #[serde(flatten)]
    attributes: BTreeMap<String, String>,
}

impl Credentials {
    /// Create credentials for `host:port` with no extra attributes
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, CredentialsError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(CredentialsError::EmptyHost);
        }
        Ok(Self {
            host,
            port,
            attributes: BTreeMap::new(),
        })
    }

    /// Create credentials from a textual port, as most brokers report it
    pub fn parse(host: impl Into<String>, port: &str) -> Result<Self, CredentialsError> {
        Self::new(host, parse_port(port)?)
    }

    /// Add an auxiliary attribute. Address keys (`host`, `hostname`, `port`)
    /// are ignored.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !RESERVED_KEYS.contains(&key.as_str()) {
            self.attributes.insert(key, value.into());
        }
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Look up an auxiliary attribute such as `username` or `vhost`
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// `host:port`, for logging
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(port: &str) -> Result<u16, CredentialsError> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| CredentialsError::InvalidPort(port.to_string()))
}

/// Wire shape accepted when deserializing credentials
#[derive(Deserialize)]
struct RawCredentials {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    port: PortValue,
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

impl TryFrom<RawCredentials> for Credentials {
    type Error = CredentialsError;

    fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
        let host = raw.host.or(raw.hostname).unwrap_or_default();
        let port = match raw.port {
            PortValue::Number(n) => {
                u16::try_from(n).map_err(|_| CredentialsError::InvalidPort(n.to_string()))?
            }
            PortValue::Text(text) => parse_port(&text)?,
        };

        let mut credentials = Self::new(host, port)?;
        for (key, value) in raw.attributes {
            // Nested values have no flat string form and are dropped
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => continue,
            };
            credentials = credentials.with_attribute(key, value);
        }
        Ok(credentials)
    }
}
