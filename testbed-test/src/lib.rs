//! Test utilities for testbed
//!
//! Provides utilities for testing code that provisions services:
//! - A scripted provisioning client that records every call
//! - A sink that records every applied session
//! - Loopback TCP listeners standing in for provisioned services
//!
//! ## Usage
//!
//! ```rust,no_run
//! use testbed_core::ServiceKind;
//! use testbed_provision::Provisioner;
//! use testbed_test::{fast_config, RecordingSink, ScriptedClient, ServiceListener};
//!
//! #[tokio::test]
//! async fn test_rabbit() {
//!     let rabbit = ServiceListener::start().await.unwrap();
//!     let client = ScriptedClient::new().with_credentials(ServiceKind::MessageBroker, rabbit.credentials());
//!     let provisioner = Provisioner::with_config(client, RecordingSink::new(), &fast_config());
//!
//!     let services = provisioner.provision([ServiceKind::MessageBroker]).await.unwrap();
//!     assert_eq!(services.len(), 1);
//! }
//! ```

pub mod client;
pub mod listener;
pub mod sink;

pub use client::{Reply, ScriptedClient};
pub use listener::{closed_port, ServiceListener, TestError};
pub use sink::RecordingSink;

use testbed_provision::{ProbeConfig, ProvisionerConfig};

/// Provisioner config with a probe budget short enough for tests
pub fn fast_config() -> ProvisionerConfig {
    ProvisionerConfig {
        probe: ProbeConfig {
            max_attempts: 5,
            initial_delay_ms: 2,
            connect_timeout_ms: 500,
        },
        ..ProvisionerConfig::default()
    }
}

/// Instance name suffix unique to this call, for sessions that run side by side
pub fn unique_suffix() -> String {
    use rand::Rng;
    format!("-test-{:06x}", rand::thread_rng().gen_range(0..0x0100_0000))
}

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "testbed_provision=debug,testbed_test=debug";

/// Route `tracing` output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with_test_writer()
        .try_init();
}
