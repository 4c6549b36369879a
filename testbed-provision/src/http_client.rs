//! Provisioning client for a JSON-over-HTTP broker
//!
//! `POST {endpoint}/services` with `{"name": "...", "kind": "..."}`. The broker
//! answers `200` with `{"credentials": {...}}` once the instance exists, or
//! `204`/`404` (or `"credentials": null`) when it could not produce one.

use crate::client::{ClientError, ServiceProvisioningClient};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use testbed_core::{Credentials, ServiceKind};
use tracing::{debug, info};
use url::Url;

#[derive(Serialize)]
struct CreateServiceRequest<'a> {
    name: &'a str,
    kind: ServiceKind,
}

#[derive(Deserialize)]
struct CreateServiceResponse {
    #[serde(default)]
    credentials: Option<Credentials>,
}

/// Client for an HTTP provisioning broker
#[derive(Debug, Clone)]
pub struct HttpServicesClient {
    services_url: Url,
    client: Client,
}

impl HttpServicesClient {
    /// Create a client for the broker at `endpoint`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let services_url = base
            .join("services")
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Backend(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            services_url,
            client,
        })
    }

    /// The URL creation requests are sent to
    pub fn services_url(&self) -> &str {
        self.services_url.as_str()
    }
}

#[async_trait]
impl ServiceProvisioningClient for HttpServicesClient {
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError> {
        debug!(url = %self.services_url, name = %name, kind = %kind, "Requesting service");

        let response = self
            .client
            .post(self.services_url.clone())
            .json(&CreateServiceRequest { name, kind })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            info!(name = %name, status = status.as_u16(), "Broker returned no credentials");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Backend(format!("{status}: {body}")));
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        let parsed: CreateServiceResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Backend(format!("Invalid credentials document: {e}")))?;
        Ok(parsed.credentials)
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Interrupted(e.to_string())
    } else if e.is_connect() {
        ClientError::Unreachable(e.to_string())
    } else {
        ClientError::Backend(e.to_string())
    }
}
