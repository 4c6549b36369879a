//! testbed - backing services for test runs
//!
//! Provisions the requested services (RabbitMQ, Redis, MongoDB, Cassandra),
//! waits for them to accept connections and then either runs a command with
//! `VCAP_SERVICES` set or prints the document to stdout.

mod config;

use clap::Parser;
use std::collections::BTreeSet;
use std::process::ExitCode;
use testbed_core::ServiceKind;
use testbed_provision::{ClientConfig, Provisioner, VcapServicesSink, VCAP_SERVICES};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "testbed")]
#[command(about = "Provision backing services for a test run", long_about = None)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "testbed", env = "TESTBED_CONFIG")]
    config: String,

    /// Provision a RabbitMQ message broker
    #[arg(long)]
    rabbitmq: bool,

    /// Provision a Redis cache
    #[arg(long)]
    redis: bool,

    /// Provision a MongoDB document store
    #[arg(long)]
    mongodb: bool,

    /// Provision a Cassandra wide-column store
    #[arg(long)]
    cassandra: bool,

    /// Provision a service by name or family (repeatable)
    #[arg(short, long = "service", value_name = "KIND")]
    services: Vec<ServiceKind>,

    /// HTTP provisioning broker; overrides the configured client
    #[arg(long, env = "TESTBED_ENDPOINT")]
    endpoint: Option<String>,

    /// Suffix for instance names
    #[arg(long)]
    name_suffix: Option<String>,

    /// Readiness probe attempts per service
    #[arg(long)]
    probe_attempts: Option<u32>,

    /// Delay after the first failed probe, in milliseconds
    #[arg(long)]
    probe_delay_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TESTBED_LOG_LEVEL")]
    log_level: String,

    /// Command to run with the provisioned services in its environment
    #[arg(last = true)]
    command: Vec<String>,
}

impl Args {
    /// Kinds selected on the command line
    fn requested(&self) -> BTreeSet<ServiceKind> {
        let flags = [
            (self.rabbitmq, ServiceKind::MessageBroker),
            (self.redis, ServiceKind::Cache),
            (self.mongodb, ServiceKind::DocumentStore),
            (self.cassandra, ServiceKind::WideColumnStore),
        ];

        flags
            .into_iter()
            .filter_map(|(set, kind)| set.then_some(kind))
            .chain(self.services.iter().copied())
            .collect()
    }

    /// Fold command line overrides into the loaded configuration
    fn apply(&self, config: &mut config::Config) {
        if let Some(endpoint) = &self.endpoint {
            config.client = ClientConfig::Http {
                endpoint: endpoint.clone(),
                timeout_secs: match config.client {
                    ClientConfig::Http { timeout_secs, .. } => timeout_secs,
                    ClientConfig::Static { .. } => 30,
                },
            };
        }
        if let Some(suffix) = &self.name_suffix {
            config.provisioner.name_suffix = suffix.clone();
        }
        if let Some(attempts) = self.probe_attempts {
            config.provisioner.probe.max_attempts = attempts;
        }
        if let Some(delay) = self.probe_delay_ms {
            config.provisioner.probe.initial_delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for VCAP_SERVICES
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("testbed={},testbed_provision={}", args.log_level, args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = config::Config::load(&args.config)?;
    args.apply(&mut config);

    let mut requested = args.requested();
    requested.extend(config.services.iter().copied());

    info!("Starting testbed...");
    for kind in ServiceKind::ALL {
        info!(
            "  {}: {}",
            kind,
            if requested.contains(&kind) { "requested" } else { "skipped" }
        );
    }

    let client = config.client.build()?;
    let sink = VcapServicesSink::new().with_name_suffix(config.provisioner.name_suffix.clone());
    let provisioner = Provisioner::with_config(client, sink, &config.provisioner);

    let services = provisioner.provision(requested).await?;
    info!(services = services.len(), "Services ready");

    if args.command.is_empty() {
        println!("{}", provisioner.sink().vcap_services().unwrap_or_default());
        return Ok(ExitCode::SUCCESS);
    }

    info!(command = ?args.command, "Running command with {}", VCAP_SERVICES);
    let status = tokio::process::Command::new(&args.command[0])
        .args(&args.command[1..])
        .envs(provisioner.sink().env_vars())
        .status()
        .await?;

    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}
