//! Loopback listeners standing in for provisioned services

use portpicker::pick_unused_port;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use testbed_core::Credentials;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

/// A port nothing is listening on
pub fn closed_port() -> Result<u16, TestError> {
    pick_unused_port().ok_or(TestError::NoPortAvailable)
}

/// A TCP listener on 127.0.0.1 that accepts and immediately closes connections
pub struct ServiceListener {
    port: u16,
    accepted: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl ServiceListener {
    /// Listen on a random free port
    pub async fn start() -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TestError::BindFailed(e.to_string()))?;
        Self::serve(listener)
    }

    /// Listen on a specific port, e.g. one handed out earlier by [`closed_port`]
    pub async fn start_on(port: u16) -> Result<Self, TestError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|_| TestError::PortInUse(port))?;
        Self::serve(listener)
    }

    fn serve(listener: TcpListener) -> Result<Self, TestError> {
        let port = listener
            .local_addr()
            .map_err(|e| TestError::BindFailed(e.to_string()))?
            .port();
        let accepted = Arc::new(AtomicU32::new(0));

        let counter = accepted.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                debug!(port, peer = %peer, "Accepted probe connection");
                drop(stream);
            }
        });

        Ok(Self {
            port,
            accepted,
            task,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Credentials pointing at this listener
    pub fn credentials(&self) -> Credentials {
        Credentials::new("127.0.0.1", self.port).expect("loopback host is never empty")
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` connections were accepted
    pub async fn wait_for_accepted(&self, count: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.accepted() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.accepted() >= count
    }
}

impl Drop for ServiceListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Errors that can occur setting up test listeners
#[derive(Debug)]
pub enum TestError {
    NoPortAvailable,
    PortInUse(u16),
    BindFailed(String),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::NoPortAvailable => write!(f, "No available port found"),
            TestError::PortInUse(port) => write!(f, "Port {} is already in use", port),
            TestError::BindFailed(msg) => write!(f, "Failed to bind listener: {}", msg),
        }
    }
}

impl std::error::Error for TestError {}
