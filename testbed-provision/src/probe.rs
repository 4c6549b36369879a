//! TCP readiness probing
//!
//! Freshly created services often take a few seconds before their listener
//! accepts connections. The probe gives them that time: it connects to the
//! service's `host:port` a fixed number of times and backs off exponentially
//! after every refused attempt (1s, 2s, 4s, 8s, 16s with the defaults).
//!
//! The probe is advisory. It never fails the caller, and it always spends its
//! whole attempt budget: a successful connection is closed straight away and
//! the next attempt follows without a pause. Only failed attempts sleep.

use crate::config::ProbeConfig;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use testbed_core::Credentials;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Final state of a probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// At least one attempt connected
    Ready,
    /// No attempt connected within the budget
    Exhausted,
}

/// What a probe run observed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub attempts: u32,
    pub successful_connections: u32,
    /// Backoff delay scheduled after each failed attempt, in order
    pub backoff: Vec<Duration>,
    /// Backoff sleeps cut short by an interrupt
    pub interrupted_sleeps: u32,
}

impl ProbeReport {
    pub fn outcome(&self) -> ProbeOutcome {
        if self.successful_connections > 0 {
            ProbeOutcome::Ready
        } else {
            ProbeOutcome::Exhausted
        }
    }

    pub fn is_ready(&self) -> bool {
        self.outcome() == ProbeOutcome::Ready
    }
}

/// Handle for cutting a probe's backoff sleep short.
///
/// An interrupt raised while no sleep is in progress is kept and ends the next
/// sleep of the same run immediately. A run discards any interrupt left over
/// from before it started.
#[derive(Debug, Clone)]
pub struct ProbeInterrupt(Arc<Notify>);

impl ProbeInterrupt {
    pub fn interrupt(&self) {
        self.0.notify_one();
    }
}

/// Bounded, backoff-retried TCP connectivity check
#[derive(Debug)]
pub struct ReadinessProbe {
    max_attempts: u32,
    initial_delay: Duration,
    connect_timeout: Duration,
    interrupt: Arc<Notify>,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl ReadinessProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: config.initial_delay(),
            connect_timeout: config.connect_timeout(),
            interrupt: Arc::new(Notify::new()),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interrupt_handle(&self) -> ProbeInterrupt {
        ProbeInterrupt(self.interrupt.clone())
    }

    /// Probe the service behind `credentials` until the attempt budget is spent
    pub async fn probe_ready(&self, credentials: &Credentials) -> ProbeReport {
        let address = credentials.address();
        info!(address = %address, "Checking host and port are available");

        self.clear_stale_interrupt().await;

        let mut report = ProbeReport::default();
        let mut delay = self.initial_delay;

        for attempt in 1..=self.max_attempts {
            report.attempts = attempt;

            match self.connect(credentials).await {
                Ok(()) => {
                    report.successful_connections += 1;
                    debug!(address = %address, attempt, "Connection accepted");
                }
                Err(e) => {
                    info!(
                        address = %address,
                        attempt,
                        error = %e,
                        "Service not available. Will try again in {}ms",
                        delay.as_millis()
                    );
                    report.backoff.push(delay);

                    let interrupted = tokio::select! {
                        () = tokio::time::sleep(delay) => false,
                        () = self.interrupt.notified() => true,
                    };

                    if interrupted {
                        // Same delay again on the next failure
                        warn!(address = %address, attempt, "Backoff sleep interrupted");
                        report.interrupted_sleeps += 1;
                    } else {
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        match report.outcome() {
            ProbeOutcome::Ready => info!(
                address = %address,
                attempts = report.attempts,
                "Service now available"
            ),
            ProbeOutcome::Exhausted => warn!(
                address = %address,
                attempts = report.attempts,
                "Readiness probe exhausted without a successful connection"
            ),
        }

        report
    }

    /// Consume an interrupt stored while no run was sleeping
    async fn clear_stale_interrupt(&self) {
        tokio::select! {
            biased;
            () = self.interrupt.notified() => debug!("Discarded interrupt from an earlier run"),
            () = std::future::ready(()) => {}
        }
    }

    async fn connect(&self, credentials: &Credentials) -> io::Result<()> {
        let stream = tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((credentials.host(), credentials.port())),
        )
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connection attempt timed out"))??;

        drop(stream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn fast_probe(max_attempts: u32, initial_delay_ms: u64) -> ReadinessProbe {
        ReadinessProbe::new(&ProbeConfig {
            max_attempts,
            initial_delay_ms,
            connect_timeout_ms: 1000,
        })
    }

    /// A port with nothing listening on it
    fn closed_port() -> u16 {
        portpicker::pick_unused_port().expect("no free port")
    }

    fn accept_forever(listener: TcpListener) -> tokio::task::JoinHandle<u32> {
        tokio::spawn(async move {
            let mut accepted = 0;
            while let Ok((stream, _)) = listener.accept().await {
                accepted += 1;
                drop(stream);
            }
            accepted
        })
    }

    #[test]
    fn test_default_budget() {
        let probe = ReadinessProbe::default();
        assert_eq!(probe.max_attempts(), 5);
        assert_eq!(probe.initial_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_reachable_service_is_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = accept_forever(listener);

        let credentials = Credentials::new("127.0.0.1", port).unwrap();
        let report = fast_probe(5, 1000).probe_ready(&credentials).await;

        assert!(report.is_ready());
        // No early exit, and no sleeping after successful attempts
        assert_eq!(report.attempts, 5);
        assert_eq!(report.successful_connections, 5);
        assert!(report.backoff.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_spends_whole_budget() {
        let credentials = Credentials::new("127.0.0.1", closed_port()).unwrap();

        let started = Instant::now();
        let report = fast_probe(5, 5).probe_ready(&credentials).await;

        assert_eq!(report.outcome(), ProbeOutcome::Exhausted);
        assert_eq!(report.attempts, 5);
        assert_eq!(report.successful_connections, 0);
        assert_eq!(
            report.backoff,
            [5, 10, 20, 40, 80].map(Duration::from_millis).to_vec()
        );
        assert!(started.elapsed() >= Duration::from_millis(155));
    }

    #[tokio::test]
    async fn test_service_that_starts_late() {
        let port = closed_port();
        let credentials = Credentials::new("127.0.0.1", port).unwrap();
        let probe = fast_probe(5, 40);

        let late_server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
            accept_forever(listener)
        });

        let report = probe.probe_ready(&credentials).await;
        drop(late_server);

        assert!(report.is_ready());
        assert_eq!(report.attempts, 5);
        assert!(!report.backoff.is_empty());
        assert!(report.successful_connections < 5);
    }

    #[tokio::test]
    async fn test_interrupted_sleep_is_not_fatal() {
        let credentials = Credentials::new("127.0.0.1", closed_port()).unwrap();
        let probe = fast_probe(2, 60_000);

        let report = tokio::time::timeout(Duration::from_secs(30), async {
            // One interrupt per minute-long backoff
            let handle = probe.interrupt_handle();
            let interrupter = tokio::spawn(async move {
                for _ in 0..2 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    handle.interrupt();
                }
            });
            let report = probe.probe_ready(&credentials).await;
            interrupter.await.unwrap();
            report
        })
        .await
        .expect("interrupted probe should finish quickly");

        assert_eq!(report.attempts, 2);
        assert_eq!(report.interrupted_sleeps, 2);
        assert_eq!(report.successful_connections, 0);
        // Backoff does not advance across an interrupted sleep
        assert_eq!(
            report.backoff,
            vec![Duration::from_secs(60), Duration::from_secs(60)]
        );
    }

    #[tokio::test]
    async fn test_interrupt_does_not_carry_over_between_runs() {
        let credentials = Credentials::new("127.0.0.1", closed_port()).unwrap();
        let probe = fast_probe(1, 100);

        // Raised after a run finished, with no sleep in progress
        probe.probe_ready(&credentials).await;
        probe.interrupt_handle().interrupt();

        let started = Instant::now();
        let report = probe.probe_ready(&credentials).await;

        assert_eq!(report.interrupted_sleeps, 0);
        assert_eq!(report.backoff, vec![Duration::from_millis(100)]);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
