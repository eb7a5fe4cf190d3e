//! Engine output types

use crate::container::ContainerState;
use crate::error::{K3dError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of `docker ps --format '{{json .}}'`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    #[serde(rename = "ID")]
    pub id: String,
    /// Comma-separated names
    pub names: String,
    pub image: String,
    /// Engine state, e.g. `running`
    #[serde(default)]
    pub state: String,
    /// Human readable status, e.g. `Up 3 minutes`
    #[serde(default)]
    pub status: String,
    /// Labels as `k=v,k=v`
    #[serde(default)]
    pub labels: String,
    /// Published ports as rendered by the engine
    #[serde(default)]
    pub ports: String,
}

impl ContainerSummary {
    /// Primary container name
    pub fn name(&self) -> &str {
        self.names.split(',').next().unwrap_or_default()
    }

    pub fn labels(&self) -> BTreeMap<&str, &str> {
        self.labels
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .collect()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().get(key).copied()
    }

    pub fn container_state(&self) -> Option<ContainerState> {
        self.state.parse().ok()
    }

    pub fn is_running(&self) -> bool {
        self.container_state()
            .map(|s| s.is_running())
            .unwrap_or(false)
    }

    /// Host-facing entries of the ports column, e.g. `0.0.0.0:6443->6443/tcp`
    pub fn public_ports(&self) -> Vec<&str> {
        self.ports
            .split(", ")
            .filter(|p| p.contains("->"))
            .collect()
    }
}

/// Parse `docker ps` JSON lines
pub fn parse_ps_output(output: &str) -> Result<Vec<ContainerSummary>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str::<ContainerSummary>(line).map_err(K3dError::from))
        .collect()
}
