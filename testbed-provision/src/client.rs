//! Provisioning client interface

use async_trait::async_trait;
use std::sync::Arc;
use testbed_core::{Credentials, ServiceKind};
use thiserror::Error;

/// Errors a provisioning client can report
#[derive(Debug, Error)]
pub enum ClientError {
    /// The creation call was cancelled before it completed
    #[error("Service creation interrupted: {0}")]
    Interrupted(String),

    /// The backend or the created service could not be reached
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend answered but refused or garbled the request
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Creates service instances and returns their credentials.
///
/// `Ok(None)` means the backend accepted the call but produced no usable
/// credentials. Implementations are not expected to retry.
#[async_trait]
pub trait ServiceProvisioningClient: Send + Sync {
    /// Create (or reuse) the instance called `name` of the given kind
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError>;
}

#[async_trait]
impl<T: ServiceProvisioningClient + ?Sized> ServiceProvisioningClient for Arc<T> {
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError> {
        (**self).create_service(name, kind).await
    }
}

#[async_trait]
impl<T: ServiceProvisioningClient + ?Sized> ServiceProvisioningClient for Box<T> {
    async fn create_service(
        &self,
        name: &str,
        kind: ServiceKind,
    ) -> Result<Option<Credentials>, ClientError> {
        (**self).create_service(name, kind).await
    }
}
