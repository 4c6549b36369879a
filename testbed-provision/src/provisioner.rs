//! Provisioning sessions
//!
//! A session creates one instance per requested kind, probes it, and hands
//! the complete set of credentials to the environment sink. Any creation
//! failure aborts the whole session; the sink then never sees a partial set.

use crate::client::ServiceProvisioningClient;
use crate::config::ProvisionerConfig;
use crate::error::ProvisionError;
use crate::probe::ReadinessProbe;
use crate::sink::EnvironmentSink;
use std::collections::BTreeSet;
use testbed_core::{Credentials, ProvisionResult, ServiceKind, SessionId};
use tracing::{info, info_span, warn, Instrument};

/// Creates the services a test run asks for
pub struct Provisioner<C, S> {
    client: C,
    sink: S,
    probe: ReadinessProbe,
    name_suffix: String,
}

impl<C, S> Provisioner<C, S>
where
    C: ServiceProvisioningClient,
    S: EnvironmentSink,
{
    /// Create a provisioner with the default naming and probe budget
    pub fn new(client: C, sink: S) -> Self {
        Self::with_config(client, sink, &ProvisionerConfig::default())
    }

    pub fn with_config(client: C, sink: S, config: &ProvisionerConfig) -> Self {
        Self {
            client,
            sink,
            probe: ReadinessProbe::new(&config.probe),
            name_suffix: config.name_suffix.clone(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn probe(&self) -> &ReadinessProbe {
        &self.probe
    }

    /// Instance name used for a kind, stable across runs
    pub fn instance_name(&self, kind: ServiceKind) -> String {
        format!("{}{}", kind.name(), self.name_suffix)
    }

    /// Provision every requested kind and apply the result to the sink.
    ///
    /// Duplicate kinds are provisioned once. An empty request yields an empty
    /// result without calling the client.
    pub async fn provision<I>(&self, requested: I) -> Result<ProvisionResult, ProvisionError>
    where
        I: IntoIterator<Item = ServiceKind>,
    {
        let requested: BTreeSet<ServiceKind> = requested.into_iter().collect();
        let session = SessionId::new();
        let span = info_span!("provision", session = %session, services = requested.len());

        async move {
            let mut services = ProvisionResult::new();
            for kind in requested {
                let credentials = self.create_service(kind).await?;
                services.insert(kind, credentials);
            }

            self.sink.apply(&services);
            info!(services = services.len(), "Provisioning complete");
            Ok::<_, ProvisionError>(services)
        }
        .instrument(span)
        .await
    }

    async fn create_service(&self, kind: ServiceKind) -> Result<Credentials, ProvisionError> {
        let name = self.instance_name(kind);
        info!(kind = %kind, name = %name, "Creating new {} service", kind);

        let credentials = self
            .client
            .create_service(&name, kind)
            .await
            .map_err(|e| ProvisionError::from_client(kind, e))?
            .ok_or(ProvisionError::NoCredentials(kind))?;

        let report = self.probe.probe_ready(&credentials).await;
        if !report.is_ready() {
            warn!(
                kind = %kind,
                address = %credentials.address(),
                attempts = report.attempts,
                "Service did not accept connections; passing its credentials on anyway"
            );
        }

        Ok(credentials)
    }
}
