//! Per-node merge of resolved port specs

use super::resolve::NodeToPortSpecMap;
use super::specifier::NodeRole;
use std::collections::HashSet;

/// Collect the binding portions that apply to one container
///
/// Role groups come first in their fixed order, then entries registered
/// under the container name. Exact duplicates are kept once.
pub fn merge(map: &NodeToPortSpecMap, role: NodeRole, container_name: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::new();

    let grouped = role.groups().iter().flat_map(|group| map.group(*group));
    for binding in grouped.chain(map.named(container_name)) {
        if seen.insert(binding.as_str()) {
            merged.push(binding.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::specifier::RoleGroup;

    #[test]
    fn test_groups_then_name() {
        let map: NodeToPortSpecMap = [("all", "80:80"), ("k3d-c-worker-0", "90:90")]
            .into_iter()
            .collect();
        assert_eq!(
            merge(&map, NodeRole::Worker, "k3d-c-worker-0"),
            vec!["80:80", "90:90"]
        );
        assert_eq!(merge(&map, NodeRole::Worker, "k3d-c-worker-1"), vec!["80:80"]);
    }

    #[test]
    fn test_role_filtering() {
        let map: NodeToPortSpecMap = [
            ("server", "6443:6443"),
            ("master", "8443:443"),
            ("workers", "9090:9090"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            merge(&map, NodeRole::Server, "k3d-c-server"),
            vec!["6443:6443", "8443:443"]
        );
        assert_eq!(merge(&map, NodeRole::Worker, "k3d-c-worker-0"), vec!["9090:9090"]);
    }

    #[test]
    fn test_dedup_across_groups() {
        let map: NodeToPortSpecMap = [
            ("all", "80:80"),
            ("server", "80:80"),
            ("master", "443"),
            ("k3d-c-server", "443"),
            ("k3d-c-server", "8080:80"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            merge(&map, NodeRole::Server, "k3d-c-server"),
            vec!["80:80", "443", "8080:80"]
        );
    }

    #[test]
    fn test_within_group_order_does_not_change_set() {
        let forward: NodeToPortSpecMap = [("all", "80"), ("all", "90"), ("workers", "80")]
            .into_iter()
            .collect();
        let reverse: NodeToPortSpecMap = [("all", "90"), ("all", "80"), ("workers", "80")]
            .into_iter()
            .collect();

        let mut a = merge(&forward, NodeRole::Worker, "w");
        let mut b = merge(&reverse, NodeRole::Worker, "w");
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_map() {
        let map = NodeToPortSpecMap::new();
        assert!(merge(&map, NodeRole::Server, "k3d-c-server").is_empty());
        assert!(map.group(RoleGroup::All).is_empty());
    }
}
