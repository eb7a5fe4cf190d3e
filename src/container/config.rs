//! Node container configuration

use crate::port::{NodeRole, PublishedPorts};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label marking every object created by k3d
pub const LABEL_APP: &str = "app";
/// Label holding the node role
pub const LABEL_COMPONENT: &str = "component";
/// Label holding the creation timestamp
pub const LABEL_CREATED: &str = "created";
/// Label holding the owning cluster name
pub const LABEL_CLUSTER: &str = "cluster";
/// Value of [`LABEL_APP`]
pub const APP_NAME: &str = "k3d";

/// Container state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Container is created but not started
    Created,
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container is restarting
    Restarting,
    /// Container is being removed
    Removing,
    /// Container has exited
    Exited,
    /// Container is in an error state
    Dead,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerState::Created => write!(f, "created"),
            ContainerState::Running => write!(f, "running"),
            ContainerState::Paused => write!(f, "paused"),
            ContainerState::Restarting => write!(f, "restarting"),
            ContainerState::Removing => write!(f, "removing"),
            ContainerState::Exited => write!(f, "exited"),
            ContainerState::Dead => write!(f, "dead"),
        }
    }
}

impl std::str::FromStr for ContainerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Ok(ContainerState::Created),
            "running" => Ok(ContainerState::Running),
            "paused" => Ok(ContainerState::Paused),
            "restarting" => Ok(ContainerState::Restarting),
            "removing" => Ok(ContainerState::Removing),
            "exited" => Ok(ContainerState::Exited),
            "dead" => Ok(ContainerState::Dead),
            other => Err(format!("unknown container state: {}", other)),
        }
    }
}

/// Labels put on a node container
pub fn node_labels(role: NodeRole, cluster: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_APP.to_string(), APP_NAME.to_string()),
        (LABEL_COMPONENT.to_string(), role.to_string()),
        (
            LABEL_CREATED.to_string(),
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        (LABEL_CLUSTER.to_string(), cluster.to_string()),
    ])
}

/// Everything needed to run one node container
#[derive(Debug, Clone, Default)]
pub struct NodeContainerConfig {
    /// Container name
    pub name: String,
    /// Hostname inside the container
    pub hostname: String,
    /// Image reference
    pub image: String,
    /// Command passed to the image entrypoint
    pub cmd: Vec<String>,
    /// Environment as `KEY=value`
    pub env: Vec<String>,
    /// Container labels
    pub labels: BTreeMap<String, String>,
    /// Bind mounts as `host:container[:opts]`
    pub volumes: Vec<String>,
    /// Paths mounted as tmpfs
    pub tmpfs: Vec<String>,
    /// Privileged mode
    pub privileged: bool,
    /// Restart policy
    pub restart: Option<String>,
    /// Network to attach to
    pub network: Option<String>,
    /// Aliases on that network
    pub network_aliases: Vec<String>,
    /// Exposed ports and host bindings
    pub ports: PublishedPorts,
}

impl NodeContainerConfig {
    /// Create a new node container configuration
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            hostname: name.to_string(),
            image: image.to_string(),
            ..Default::default()
        }
    }

    /// Set command to run
    pub fn cmd(mut self, cmd: Vec<String>) -> Self {
        self.cmd = cmd;
        self
    }

    /// Add environment variable
    pub fn env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    /// Add several environment variables
    pub fn envs<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Replace labels
    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Add bind mounts
    pub fn volumes(mut self, volumes: &[String]) -> Self {
        self.volumes
            .extend(volumes.iter().filter(|v| !v.is_empty()).cloned());
        self
    }

    /// Mount a tmpfs at `path`
    pub fn tmpfs(mut self, path: &str) -> Self {
        self.tmpfs.push(path.to_string());
        self
    }

    /// Set privileged mode
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Set restart policy
    pub fn restart(mut self, policy: &str) -> Self {
        self.restart = Some(policy.to_string());
        self
    }

    /// Attach to a network under the given alias
    pub fn network(mut self, network: &str, alias: &str) -> Self {
        self.network = Some(network.to_string());
        self.network_aliases.push(alias.to_string());
        self
    }

    /// Set published ports
    pub fn ports(mut self, ports: PublishedPorts) -> Self {
        self.ports = ports;
        self
    }

    /// Value of a label
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse() {
        assert_eq!(
            "running".parse::<ContainerState>().unwrap(),
            ContainerState::Running
        );
        assert_eq!(
            "Exited".parse::<ContainerState>().unwrap(),
            ContainerState::Exited
        );
        assert!("sleeping".parse::<ContainerState>().is_err());
        assert!(ContainerState::Running.is_running());
        assert!(!ContainerState::Created.is_running());
    }

    #[test]
    fn test_node_labels() {
        let labels = node_labels(NodeRole::Worker, "dev");
        assert_eq!(labels.get(LABEL_APP).unwrap(), "k3d");
        assert_eq!(labels.get(LABEL_COMPONENT).unwrap(), "worker");
        assert_eq!(labels.get(LABEL_CLUSTER).unwrap(), "dev");
        assert_eq!(labels.get(LABEL_CREATED).unwrap().len(), 19);
    }

    #[test]
    fn test_builder() {
        let config = NodeContainerConfig::new("k3d-dev-server", "docker.io/rancher/k3s:latest")
            .cmd(vec!["server".to_string()])
            .env("A=1")
            .envs(["B=2", "C=3"])
            .volumes(&["".to_string(), "/tmp:/tmp".to_string()])
            .tmpfs("/run")
            .privileged(true)
            .network("dev", "k3d-dev-server")
            .labels(node_labels(NodeRole::Server, "dev"));

        assert_eq!(config.hostname, "k3d-dev-server");
        assert_eq!(config.env, vec!["A=1", "B=2", "C=3"]);
        assert_eq!(config.volumes, vec!["/tmp:/tmp"]);
        assert_eq!(config.network.as_deref(), Some("dev"));
        assert_eq!(config.label(LABEL_COMPONENT), Some("server"));
        assert!(config.restart.is_none());
    }
}
