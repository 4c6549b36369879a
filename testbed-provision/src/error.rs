//! Provisioning failures

use crate::client::ClientError;
use testbed_core::ServiceKind;
use thiserror::Error;

/// A provisioning session failed. Always fatal: the session is aborted and no
/// credentials are handed to the environment sink.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Unable to create credentials for {0} service. Cannot recover")]
    NoCredentials(ServiceKind),

    #[error("Cannot create {kind} service: {source}")]
    Interrupted {
        kind: ServiceKind,
        #[source]
        source: ClientError,
    },

    #[error(
        "Cannot create {kind} service. Credentials were created but it is not serving on the provided host and port"
    )]
    Unreachable {
        kind: ServiceKind,
        #[source]
        source: ClientError,
    },

    #[error("Cannot create {kind} service: {source}")]
    Client {
        kind: ServiceKind,
        #[source]
        source: ClientError,
    },
}

impl ProvisionError {
    /// Wrap a client failure for the kind being created
    pub fn from_client(kind: ServiceKind, source: ClientError) -> Self {
        match source {
            ClientError::Interrupted(_) => Self::Interrupted { kind, source },
            ClientError::Unreachable(_) | ClientError::Io(_) => Self::Unreachable { kind, source },
            ClientError::Backend(_) | ClientError::InvalidEndpoint(_) => {
                Self::Client { kind, source }
            }
        }
    }

    /// The kind whose creation failed
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::NoCredentials(kind)
            | Self::Interrupted { kind, .. }
            | Self::Unreachable { kind, .. }
            | Self::Client { kind, .. } => *kind,
        }
    }
}
