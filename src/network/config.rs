//! Cluster network configuration

use crate::container::{APP_NAME, LABEL_APP, LABEL_CLUSTER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Network driver types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkDriver {
    /// Bridge network (default)
    #[default]
    Bridge,
    /// Overlay network
    Overlay,
}

impl std::fmt::Display for NetworkDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkDriver::Bridge => write!(f, "bridge"),
            NetworkDriver::Overlay => write!(f, "overlay"),
        }
    }
}

/// Private network shared by the nodes of one cluster
///
/// The network is named after the cluster, so node containers can reach
/// the server under its container name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNetwork {
    /// Network name
    pub name: String,
    /// Network driver
    pub driver: NetworkDriver,
    /// Network labels
    pub labels: BTreeMap<String, String>,
}

impl ClusterNetwork {
    /// Network for the given cluster
    pub fn for_cluster(cluster: &str) -> Self {
        Self {
            name: cluster.to_string(),
            driver: NetworkDriver::default(),
            labels: Self::cluster_labels(cluster),
        }
    }

    /// Labels identifying networks of a cluster
    pub fn cluster_labels(cluster: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_APP.to_string(), APP_NAME.to_string()),
            (LABEL_CLUSTER.to_string(), cluster.to_string()),
        ])
    }

    /// `label=key=value` filters matching this network
    pub fn label_filters(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|(k, v)| format!("label={}={}", k, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_cluster() {
        let network = ClusterNetwork::for_cluster("dev");
        assert_eq!(network.name, "dev");
        assert_eq!(network.driver, NetworkDriver::Bridge);
        assert_eq!(network.labels.get("app").unwrap(), "k3d");
        assert_eq!(network.labels.get("cluster").unwrap(), "dev");
    }

    #[test]
    fn test_label_filters() {
        let network = ClusterNetwork::for_cluster("dev");
        assert_eq!(
            network.label_filters(),
            vec!["label=app=k3d", "label=cluster=dev"]
        );
    }

    #[test]
    fn test_driver_display() {
        assert_eq!(NetworkDriver::Bridge.to_string(), "bridge");
        assert_eq!(NetworkDriver::Overlay.to_string(), "overlay");
    }
}
