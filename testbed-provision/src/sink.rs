//! Environment sinks
//!
//! A sink receives the credentials of a completed provisioning session and
//! makes them available to the code under test. [`VcapServicesSink`] renders
//! them the way Cloud Foundry exposes bound services: a `VCAP_SERVICES` JSON
//! document keyed by service label.

use crate::DEFAULT_NAME_SUFFIX;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use testbed_core::ProvisionResult;
use tracing::debug;

/// Environment variable carrying the bound services document
pub const VCAP_SERVICES: &str = "VCAP_SERVICES";

/// Consumer of a completed provisioning session
pub trait EnvironmentSink: Send + Sync {
    fn apply(&self, services: &ProvisionResult);
}

impl<T: EnvironmentSink + ?Sized> EnvironmentSink for Arc<T> {
    fn apply(&self, services: &ProvisionResult) {
        (**self).apply(services);
    }
}

impl<T: EnvironmentSink + ?Sized> EnvironmentSink for Box<T> {
    fn apply(&self, services: &ProvisionResult) {
        (**self).apply(services);
    }
}

/// Collects `VCAP_SERVICES` for injection into a child process environment
#[derive(Debug)]
pub struct VcapServicesSink {
    name_suffix: String,
    vars: Mutex<BTreeMap<String, String>>,
}

impl Default for VcapServicesSink {
    fn default() -> Self {
        Self::new()
    }
}

impl VcapServicesSink {
    pub fn new() -> Self {
        Self {
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
            vars: Mutex::new(BTreeMap::new()),
        }
    }

    /// Use the same suffix the provisioner names instances with
    #[must_use]
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = suffix.into();
        self
    }

    /// Build the `VCAP_SERVICES` document for a session
    pub fn render(&self, services: &ProvisionResult) -> Value {
        let mut document = Map::new();

        for (kind, credentials) in services {
            let mut fields = Map::new();
            fields.insert("host".to_string(), json!(credentials.host()));
            fields.insert("hostname".to_string(), json!(credentials.host()));
            fields.insert("port".to_string(), json!(credentials.port()));
            for (key, value) in credentials.attributes() {
                fields.insert(key.clone(), json!(value));
            }

            let instance = json!({
                "name": format!("{}{}", kind.name(), self.name_suffix),
                "label": kind.name(),
                "tags": [kind.name(), kind.family()],
                "plan": "default",
                "credentials": fields,
            });
            document.insert(kind.name().to_string(), json!([instance]));
        }

        Value::Object(document)
    }

    /// Environment variables produced by the last applied session
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        self.vars.lock().clone()
    }

    /// The last rendered `VCAP_SERVICES` value, if a session was applied
    pub fn vcap_services(&self) -> Option<String> {
        self.vars.lock().get(VCAP_SERVICES).cloned()
    }
}

impl EnvironmentSink for VcapServicesSink {
    fn apply(&self, services: &ProvisionResult) {
        let document = self.render(services).to_string();
        debug!(services = services.len(), "Setting {}", VCAP_SERVICES);
        self.vars.lock().insert(VCAP_SERVICES.to_string(), document);
    }
}
