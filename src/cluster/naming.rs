//! Container names of cluster nodes

use crate::port::NodeRole;

/// Prefix shared by every node container
pub const CONTAINER_NAME_PREFIX: &str = "k3d";

/// `k3d-<cluster>-<role>[-<postfix>]`
pub fn container_name(role: NodeRole, cluster: &str, postfix: Option<usize>) -> String {
    match postfix {
        Some(i) => format!("{}-{}-{}-{}", CONTAINER_NAME_PREFIX, cluster, role, i),
        None => format!("{}-{}-{}", CONTAINER_NAME_PREFIX, cluster, role),
    }
}

/// Name of the `index`-th server; a single server carries no postfix
pub fn server_name(cluster: &str, index: usize, server_count: usize) -> String {
    let postfix = (server_count > 1).then_some(index);
    container_name(NodeRole::Server, cluster, postfix)
}

pub fn worker_name(cluster: &str, index: usize) -> String {
    container_name(NodeRole::Worker, cluster, Some(index))
}

/// Every container name a cluster of this shape will have, servers first
pub fn all_container_names(cluster: &str, server_count: usize, worker_count: usize) -> Vec<String> {
    let servers = (0..server_count).map(|i| server_name(cluster, i, server_count));
    let workers = (0..worker_count).map(|i| worker_name(cluster, i));
    servers.chain(workers).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_name() {
        assert_eq!(
            container_name(NodeRole::Server, "dev", None),
            "k3d-dev-server"
        );
        assert_eq!(
            container_name(NodeRole::Worker, "dev", Some(3)),
            "k3d-dev-worker-3"
        );
    }

    #[test]
    fn test_all_container_names() {
        assert_eq!(
            all_container_names("dev", 1, 2),
            vec!["k3d-dev-server", "k3d-dev-worker-0", "k3d-dev-worker-1"]
        );
        assert_eq!(
            all_container_names("dev", 2, 0),
            vec!["k3d-dev-server-0", "k3d-dev-server-1"]
        );
        assert!(all_container_names("dev", 0, 0).is_empty());
    }

    #[test]
    fn test_names_are_deterministic() {
        assert_eq!(all_container_names("a", 1, 3), all_container_names("a", 1, 3));
    }
}
