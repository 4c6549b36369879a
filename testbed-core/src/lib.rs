//! Core types for testbed
//!
//! This crate provides the value types shared by the provisioner, the
//! provisioning clients and the environment sinks.

pub mod credentials;
pub mod error;
pub mod kind;
pub mod result;
pub mod session;

pub use credentials::Credentials;
pub use error::{CredentialsError, UnknownServiceKind};
pub use kind::ServiceKind;
pub use result::ProvisionResult;
pub use session::SessionId;
