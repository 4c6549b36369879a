//! Configuration management

use serde::Deserialize;
use testbed_core::ServiceKind;
use testbed_provision::{ClientConfig, ProvisionerConfig};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Kinds to provision in addition to those given on the command line
    #[serde(default)]
    pub services: Vec<ServiceKind>,

    #[serde(default)]
    pub provisioner: ProvisionerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// The file is optional; `TESTBED_<SECTION>__<KEY>` variables override it,
    /// e.g. `TESTBED_PROVISIONER__NAME_SUFFIX=-ci`. `TESTBED_SERVICES` takes a
    /// comma-separated list of kinds.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: &str, environment: config::Environment) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }

    /// Parse a TOML document
    #[cfg(test)]
    pub fn from_toml(document: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(document)?)
    }
}

/// `TESTBED_*` variables, with numbers and booleans parsed so tagged sections
/// such as `[client]` deserialize
fn environment() -> config::Environment {
    config::Environment::with_prefix("TESTBED")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("services")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert!(config.services.is_empty());
        assert_eq!(config.provisioner.name_suffix, "-test");
        assert_eq!(config.provisioner.probe.max_attempts, 5);
        assert!(matches!(config.client, ClientConfig::Static { .. }));
    }

    #[test]
    fn test_full_document() {
        let config = Config::from_toml(
            r#"
            services = ["rabbitmq", "cache"]

            [provisioner]
            name_suffix = "-ci"

            [provisioner.probe]
            max_attempts = 3

            [client]
            type = "http"
            endpoint = "http://broker.local:8080"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(
            config.services,
            vec![ServiceKind::MessageBroker, ServiceKind::Cache]
        );
        assert_eq!(config.provisioner.name_suffix, "-ci");
        assert_eq!(config.provisioner.probe.max_attempts, 3);
        assert_eq!(config.provisioner.probe.initial_delay_ms, 1000);
        assert!(matches!(
            config.client,
            ClientConfig::Http { timeout_secs: 10, .. }
        ));
    }

    #[test]
    fn test_unknown_service_is_rejected() {
        assert!(Config::from_toml(r#"services = ["postgres"]"#).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("does-not-exist/testbed").unwrap();
        assert_eq!(config.provisioner.name_suffix, "-test");
    }

    #[test]
    fn test_environment_overrides() {
        let variables = [
            ("TESTBED_SERVICES", "rabbitmq,redis"),
            ("TESTBED_PROVISIONER__NAME_SUFFIX", "-ci"),
            ("TESTBED_PROVISIONER__PROBE__MAX_ATTEMPTS", "3"),
            ("TESTBED_CLIENT__TYPE", "http"),
            ("TESTBED_CLIENT__ENDPOINT", "http://broker:8080"),
            ("TESTBED_CLIENT__TIMEOUT_SECS", "10"),
        ];
        let source = variables
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let config =
            Config::load_with("does-not-exist/testbed", environment().source(Some(source)))
                .unwrap();

        assert_eq!(
            config.services,
            vec![ServiceKind::MessageBroker, ServiceKind::Cache]
        );
        assert_eq!(config.provisioner.name_suffix, "-ci");
        assert_eq!(config.provisioner.probe.max_attempts, 3);
        assert!(matches!(
            &config.client,
            ClientConfig::Http { endpoint, timeout_secs: 10 } if endpoint == "http://broker:8080"
        ));
    }
}
