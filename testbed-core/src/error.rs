//! Error types for the core value types

use thiserror::Error;

/// A service kind name that is not one of the supported families
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown service kind: {0}")]
pub struct UnknownServiceKind(pub String);

/// Errors from building credentials
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("Host must not be empty")]
    EmptyHost,

    #[error("Invalid port: {0}")]
    InvalidPort(String),
}
