//! Scripted provisioning client

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use testbed_core::{Credentials, ServiceKind};
use testbed_provision::{ClientError, ServiceProvisioningClient};

/// How the scripted client answers for one kind
#[derive(Debug, Clone)]
pub enum Reply {
    Credentials(Credentials),
    /// Accepted, but no credentials came back
    Absent,
    Interrupted,
    Unreachable,
}

/// Client that answers from a per-kind script and records every call.
///
/// Kinds without a script get [`Reply::Absent`].
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: BTreeMap<ServiceKind, Reply>,
    calls: Mutex<Vec<(String, ServiceKind)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reply(mut self, kind: ServiceKind, reply: Reply) -> Self {
        self.replies.insert(kind, reply);
        self
    }

    #[must_use]
    pub fn with_credentials(self, kind: ServiceKind, credentials: Credentials) -> Self {
        self.with_reply(kind, Reply::Credentials(credentials))
    }

    /// `(name, kind)` for every call so far, in order
    pub fn calls(&self) -> Vec<(String, ServiceKind)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ServiceProvisioningClient for ScriptedClient {
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError> {
        self.calls.lock().push((name.to_string(), kind));

        match self.replies.get(&kind).cloned().unwrap_or(Reply::Absent) {
            Reply::Credentials(credentials) => Ok(Some(credentials)),
            Reply::Absent => Ok(None),
            Reply::Interrupted => Err(ClientError::Interrupted(format!("{name} cancelled"))),
            Reply::Unreachable => Err(ClientError::Unreachable(format!(
                "{name} created but not listening"
            ))),
        }
    }
}
