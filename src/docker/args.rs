//! Argument lists for the `docker` CLI
//!
//! Everything here is pure so the exact invocations can be tested without
//! a running engine.

use crate::container::NodeContainerConfig;
use crate::network::ClusterNetwork;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// `docker run --detach ...` for a node container
pub fn run_args(config: &NodeContainerConfig) -> Vec<String> {
    let mut args = strings(&["run", "--detach"]);

    args.push("--name".to_string());
    args.push(config.name.clone());
    args.push("--hostname".to_string());
    args.push(config.hostname.clone());

    if config.privileged {
        args.push("--privileged".to_string());
    }

    if let Some(ref policy) = config.restart {
        args.push("--restart".to_string());
        args.push(policy.clone());
    }

    for (key, value) in &config.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    for entry in &config.env {
        args.push("--env".to_string());
        args.push(entry.clone());
    }

    for volume in &config.volumes {
        args.push("--volume".to_string());
        args.push(volume.clone());
    }

    for path in &config.tmpfs {
        args.push("--tmpfs".to_string());
        args.push(path.clone());
    }

    if let Some(ref network) = config.network {
        args.push("--network".to_string());
        args.push(network.clone());
        for alias in &config.network_aliases {
            args.push("--network-alias".to_string());
            args.push(alias.clone());
        }
    }

    for port in config.ports.exposed() {
        args.push("--expose".to_string());
        args.push(port.to_string());
    }

    for publish in config.ports.publish_args() {
        args.push("--publish".to_string());
        args.push(publish);
    }

    args.push(config.image.clone());
    args.extend(config.cmd.iter().cloned());

    args
}

/// `docker ps` listing containers matching all label filters as JSON lines
pub fn ps_args(labels: &[(&str, &str)], all: bool) -> Vec<String> {
    let mut args = strings(&["ps", "--no-trunc"]);
    if all {
        args.push("--all".to_string());
    }
    for (key, value) in labels {
        args.push("--filter".to_string());
        args.push(format!("label={}={}", key, value));
    }
    args.push("--format".to_string());
    args.push("{{json .}}".to_string());
    args
}

pub fn start_args(id: &str) -> Vec<String> {
    strings(&["start", id])
}

pub fn stop_args(id: &str) -> Vec<String> {
    strings(&["stop", id])
}

/// Always forced, like the engine's remove with `force`
pub fn rm_args(id: &str) -> Vec<String> {
    strings(&["rm", "--force", id])
}

pub fn logs_args(id: &str) -> Vec<String> {
    strings(&["logs", id])
}

/// Copy a path out of a container as a tar stream on stdout
pub fn cp_from_args(id: &str, path: &str) -> Vec<String> {
    vec!["cp".to_string(), format!("{}:{}", id, path), "-".to_string()]
}

pub fn exec_args(id: &str, cmd: &[&str]) -> Vec<String> {
    let mut args = strings(&["exec", id]);
    args.extend(cmd.iter().map(|s| s.to_string()));
    args
}

pub fn network_create_args(network: &ClusterNetwork) -> Vec<String> {
    let mut args = strings(&["network", "create", "--driver"]);
    args.push(network.driver.to_string());
    for (key, value) in &network.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.push(network.name.clone());
    args
}

/// Quiet network listing, one ID per line
pub fn network_ls_args(network: &ClusterNetwork) -> Vec<String> {
    let mut args = strings(&["network", "ls", "--quiet"]);
    for filter in network.label_filters() {
        args.push("--filter".to_string());
        args.push(filter);
    }
    args
}

pub fn network_rm_args(id: &str) -> Vec<String> {
    strings(&["network", "rm", id])
}

pub fn save_args(image: &str, output: &str) -> Vec<String> {
    strings(&["save", "--output", output, image])
}

pub fn version_args() -> Vec<String> {
    strings(&["version", "--format", "{{.Server.APIVersion}}"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PublishedPorts;
    use std::collections::BTreeMap;

    #[test]
    fn test_run_args() {
        let config = NodeContainerConfig::new("k3d-dev-worker-0", "docker.io/rancher/k3s:latest")
            .cmd(vec!["agent".to_string()])
            .env("K3S_URL=https://k3d-dev-server:6443")
            .labels(BTreeMap::from([("app".to_string(), "k3d".to_string())]))
            .tmpfs("/run")
            .privileged(true)
            .restart("unless-stopped")
            .network("dev", "k3d-dev-worker-0")
            .ports(PublishedPorts::build(&["8080:80"]).unwrap());

        let args = run_args(&config);
        assert_eq!(&args[..2], &["run", "--detach"]);
        let joined = args.join(" ");
        assert!(joined.contains("--name k3d-dev-worker-0"));
        assert!(joined.contains("--privileged"));
        assert!(joined.contains("--restart unless-stopped"));
        assert!(joined.contains("--label app=k3d"));
        assert!(joined.contains("--env K3S_URL=https://k3d-dev-server:6443"));
        assert!(joined.contains("--tmpfs /run"));
        assert!(joined.contains("--network dev --network-alias k3d-dev-worker-0"));
        assert!(joined.contains("--expose 80/tcp"));
        assert!(joined.contains("--publish 8080:80/tcp"));
        assert!(joined.ends_with("docker.io/rancher/k3s:latest agent"));
    }

    #[test]
    fn test_ps_args() {
        let args = ps_args(&[("app", "k3d"), ("cluster", "dev")], true);
        assert_eq!(
            args,
            vec![
                "ps",
                "--no-trunc",
                "--all",
                "--filter",
                "label=app=k3d",
                "--filter",
                "label=cluster=dev",
                "--format",
                "{{json .}}",
            ]
        );
    }

    #[test]
    fn test_cp_from_args() {
        assert_eq!(
            cp_from_args("abc", "/output/kubeconfig.yaml"),
            vec!["cp", "abc:/output/kubeconfig.yaml", "-"]
        );
    }

    #[test]
    fn test_network_args() {
        let network = ClusterNetwork::for_cluster("dev");
        assert_eq!(
            network_create_args(&network),
            vec![
                "network",
                "create",
                "--driver",
                "bridge",
                "--label",
                "app=k3d",
                "--label",
                "cluster=dev",
                "dev",
            ]
        );
        assert_eq!(
            network_ls_args(&network),
            vec![
                "network",
                "ls",
                "--quiet",
                "--filter",
                "label=app=k3d",
                "--filter",
                "label=cluster=dev",
            ]
        );
    }

    #[test]
    fn test_simple_args() {
        assert_eq!(rm_args("abc"), vec!["rm", "--force", "abc"]);
        assert_eq!(exec_args("abc", &["ls", "/"]), vec!["exec", "abc", "ls", "/"]);
        assert_eq!(
            save_args("nginx:latest", "/tmp/nginx.tar"),
            vec!["save", "--output", "/tmp/nginx.tar", "nginx:latest"]
        );
    }
}
