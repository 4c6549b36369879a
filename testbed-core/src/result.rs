//! Result of one provisioning session

use crate::credentials::Credentials;
use crate::kind::ServiceKind;
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// Credentials for every service provisioned in a session, keyed by kind.
///
/// Holds at most one entry per kind. Built by a single `provision` call and
/// returned by value; a failed session never produces one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProvisionResult {
    services: BTreeMap<ServiceKind, Credentials>,
}

impl ProvisionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record credentials for a kind, returning any previous entry
    pub fn insert(&mut self, kind: ServiceKind, credentials: Credentials) -> Option<Credentials> {
        self.services.insert(kind, credentials)
    }

    pub fn get(&self, kind: ServiceKind) -> Option<&Credentials> {
        self.services.get(&kind)
    }

    pub fn contains(&self, kind: ServiceKind) -> bool {
        self.services.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Provisioned kinds in a stable order
    pub fn kinds(&self) -> impl Iterator<Item = ServiceKind> + '_ {
        self.services.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ServiceKind, Credentials> {
        self.services.iter()
    }

    pub fn into_inner(self) -> BTreeMap<ServiceKind, Credentials> {
        self.services
    }
}

impl<'a> IntoIterator for &'a ProvisionResult {
    type Item = (&'a ServiceKind, &'a Credentials);
    type IntoIter = btree_map::Iter<'a, ServiceKind, Credentials>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ProvisionResult {
    type Item = (ServiceKind, Credentials);
    type IntoIter = btree_map::IntoIter<ServiceKind, Credentials>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_entry_per_kind() {
        let mut result = ProvisionResult::new();
        assert!(result.is_empty());

        let first = Credentials::new("a", 6379).unwrap();
        let second = Credentials::new("b", 6379).unwrap();

        assert!(result.insert(ServiceKind::Cache, first.clone()).is_none());
        assert_eq!(result.insert(ServiceKind::Cache, second.clone()), Some(first));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(ServiceKind::Cache), Some(&second));
        assert!(!result.contains(ServiceKind::MessageBroker));
    }

    #[test]
    fn test_serializes_by_canonical_name() {
        let mut result = ProvisionResult::new();
        result.insert(
            ServiceKind::MessageBroker,
            Credentials::new("localhost", 5672).unwrap(),
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"rabbitmq": {"host": "localhost", "port": 5672}})
        );
    }
}
