//! Service provisioning for testbed
//!
//! Creates backing services (RabbitMQ, Redis, MongoDB, Cassandra) through a
//! provisioning client, waits for each one to accept TCP connections and hands
//! the resulting credentials to an environment sink.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use testbed_core::ServiceKind;
//! use testbed_provision::{Provisioner, StaticServicesClient, VcapServicesSink};
//!
//! # async fn run(client: StaticServicesClient) -> Result<(), testbed_provision::ProvisionError> {
//! let provisioner = Provisioner::new(client, VcapServicesSink::new());
//! let services = provisioner
//!     .provision([ServiceKind::MessageBroker, ServiceKind::Cache])
//!     .await?;
//!
//! println!("{}", provisioner.sink().vcap_services().unwrap_or_default());
//! # let _ = services;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod probe;
pub mod provisioner;
pub mod sink;
pub mod static_client;

pub use client::{ClientError, ServiceProvisioningClient};
pub use config::{ClientConfig, ProbeConfig, ProvisionerConfig};
pub use error::ProvisionError;
pub use http_client::HttpServicesClient;
pub use probe::{ProbeInterrupt, ProbeOutcome, ProbeReport, ReadinessProbe};
pub use provisioner::Provisioner;
pub use sink::{EnvironmentSink, VcapServicesSink, VCAP_SERVICES};
pub use static_client::StaticServicesClient;

/// Suffix appended to a kind's canonical name to form the instance name
pub const DEFAULT_NAME_SUFFIX: &str = "-test";
