//! Provisioning client backed by pre-declared credentials
//!
//! Useful when the services already run next to the tests (docker compose,
//! CI service containers) and only need to be located and probed.

use crate::client::{ClientError, ServiceProvisioningClient};
use async_trait::async_trait;
use std::collections::BTreeMap;
use testbed_core::{Credentials, ServiceKind};
use tracing::debug;

/// Client that hands out fixed credentials per kind
#[derive(Debug, Clone, Default)]
pub struct StaticServicesClient {
    services: BTreeMap<ServiceKind, Credentials>,
}

impl StaticServicesClient {
    pub fn new(services: BTreeMap<ServiceKind, Credentials>) -> Self {
        Self { services }
    }

    /// Declare credentials for a kind
    #[must_use]
    pub fn with_service(mut self, kind: ServiceKind, credentials: Credentials) -> Self {
        self.services.insert(kind, credentials);
        self
    }
}

#[async_trait]
impl ServiceProvisioningClient for StaticServicesClient {
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError> {
        let credentials = self.services.get(&kind).cloned();
        debug!(
            name = %name,
            kind = %kind,
            declared = credentials.is_some(),
            "Resolved static service"
        );
        Ok(credentials)
    }
}
