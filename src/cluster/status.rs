//! Cluster view assembled from node containers

use crate::docker::ContainerSummary;
use std::fmt;

/// A cluster as found on the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub image: String,
    pub status: String,
    /// Host-facing port entries of the server
    pub server_ports: Vec<String>,
    pub server: ContainerSummary,
    pub workers: Vec<ContainerSummary>,
}

impl Cluster {
    pub fn new(name: &str, server: ContainerSummary, workers: Vec<ContainerSummary>) -> Self {
        Self {
            name: name.to_string(),
            image: server.image.clone(),
            status: cluster_status(&server, &workers),
            server_ports: server.public_ports().into_iter().map(str::to_string).collect(),
            server,
            workers,
        }
    }

    pub fn running_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_running()).count()
    }

    /// `running/total` worker count
    pub fn worker_summary(&self) -> String {
        format!("{}/{}", self.running_workers(), self.workers.len())
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.status)
    }
}

/// `unhealthy` when any worker disagrees with the server, `stopped` when
/// the server exited, the server state otherwise
pub fn cluster_status(server: &ContainerSummary, workers: &[ContainerSummary]) -> String {
    if workers.iter().any(|w| w.state != server.state) {
        return "unhealthy".to_string();
    }
    match server.state.as_str() {
        "exited" => "stopped".to_string(),
        state => state.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(state: &str) -> ContainerSummary {
        ContainerSummary {
            id: "id".to_string(),
            image: "docker.io/rancher/k3s:latest".to_string(),
            state: state.to_string(),
            ports: "0.0.0.0:6443->6443/tcp".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_status() {
        assert_eq!(cluster_status(&container("running"), &[]), "running");
        assert_eq!(
            cluster_status(&container("running"), &[container("running")]),
            "running"
        );
        assert_eq!(
            cluster_status(&container("running"), &[container("exited")]),
            "unhealthy"
        );
        assert_eq!(
            cluster_status(&container("exited"), &[container("exited")]),
            "stopped"
        );
    }

    #[test]
    fn test_cluster_view() {
        let cluster = Cluster::new(
            "dev",
            container("running"),
            vec![container("running"), container("exited")],
        );
        assert_eq!(cluster.image, "docker.io/rancher/k3s:latest");
        assert_eq!(cluster.status, "unhealthy");
        assert_eq!(cluster.server_ports, vec!["0.0.0.0:6443->6443/tcp"]);
        assert_eq!(cluster.worker_summary(), "1/2");
        assert_eq!(cluster.to_string(), "dev (unhealthy)");
    }
}
