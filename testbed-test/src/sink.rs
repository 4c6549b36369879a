//! Recording environment sink

use parking_lot::Mutex;
use testbed_core::ProvisionResult;
use testbed_provision::EnvironmentSink;

/// Sink that keeps every session it was given
#[derive(Debug, Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<ProvisionResult>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every applied session, oldest first
    pub fn applied(&self) -> Vec<ProvisionResult> {
        self.applied.lock().clone()
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().len()
    }

    pub fn last(&self) -> Option<ProvisionResult> {
        self.applied.lock().last().cloned()
    }
}

impl EnvironmentSink for RecordingSink {
    fn apply(&self, services: &ProvisionResult) {
        self.applied.lock().push(services.clone());
    }
}
