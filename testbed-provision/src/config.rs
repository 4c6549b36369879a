//! Provisioner, probe and client configuration

use crate::client::{ClientError, ServiceProvisioningClient};
use crate::http_client::HttpServicesClient;
use crate::static_client::StaticServicesClient;
use crate::DEFAULT_NAME_SUFFIX;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use testbed_core::{Credentials, ServiceKind};

/// Provisioner settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionerConfig {
    /// Appended to the kind name to form the instance name
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,

    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            name_suffix: default_name_suffix(),
            probe: ProbeConfig::default(),
        }
    }
}

/// Readiness probe settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Connection attempts per service, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff after the first failed attempt; doubled after each failure
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on a single connection attempt
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Which provisioning backend to talk to
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientConfig {
    /// Credentials declared up front, one entry per kind
    #[serde(rename = "static")]
    Static {
        #[serde(default)]
        services: BTreeMap<ServiceKind, Credentials>,
    },

    /// JSON-over-HTTP provisioning broker
    #[serde(rename = "http")]
    Http {
        endpoint: String,

        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::Static {
            services: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Build the configured client
    pub fn build(&self) -> Result<Box<dyn ServiceProvisioningClient>, ClientError> {
        match self {
            Self::Static { services } => Ok(Box::new(StaticServicesClient::new(services.clone()))),
            Self::Http {
                endpoint,
                timeout_secs,
            } => Ok(Box::new(HttpServicesClient::new(
                endpoint,
                Duration::from_secs(*timeout_secs),
            )?)),
        }
    }
}

fn default_name_suffix() -> String {
    DEFAULT_NAME_SUFFIX.to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}
