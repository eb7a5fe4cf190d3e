//! Cluster configuration

use crate::error::{K3dError, Result};
use crate::port::lookup_host;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Cluster name used when none is given
pub const DEFAULT_CLUSTER_NAME: &str = "k3s-default";
/// k3s image repository
pub const DEFAULT_K3S_IMAGE: &str = "docker.io/rancher/k3s";
/// k3s image tag
pub const DEFAULT_K3S_VERSION: &str = "latest";
/// Registry prepended to image references without a registry host
pub const DEFAULT_REGISTRY: &str = "docker.io";
/// Port of the Kubernetes API server
pub const DEFAULT_API_PORT: u16 = 6443;
/// Servers per cluster
pub const DEFAULT_SERVER_COUNT: usize = 1;

/// Full default image reference
pub fn default_image() -> String {
    format!("{}:{}", DEFAULT_K3S_IMAGE, DEFAULT_K3S_VERSION)
}

/// Prefix the default registry when the reference names none
///
/// The first path segment is a registry host if it contains a `.` or a
/// `:` or is `localhost`.
pub fn normalize_image(image: &str) -> String {
    let has_registry = match image.split_once('/') {
        Some((first, _)) => first.contains('.') || first.contains(':') || first == "localhost",
        None => false,
    };

    if has_registry {
        image.to_string()
    } else {
        format!("{}/{}", DEFAULT_REGISTRY, image)
    }
}

/// Kubernetes API endpoint: `[host:]port`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPort {
    /// Host the API is published on, all interfaces when absent
    pub host: Option<String>,
    /// Address `host` resolved to when parsed
    #[serde(default)]
    pub host_ip: Option<IpAddr>,
    pub port: u16,
}

impl ApiPort {
    /// Parse `[host:]port`, the host is resolved here, once
    pub fn parse(spec: &str) -> Result<Self> {
        let (host, port) = match spec.split(':').collect::<Vec<_>>().as_slice() {
            [port] => (None, *port),
            [host, port] => (Some(*host), *port),
            _ => {
                return Err(K3dError::InvalidApiPort(format!(
                    "[{}] must be of the form [host:]port",
                    spec
                )))
            }
        };

        let host_ip = host
            .map(|host| lookup_host(host).map_err(K3dError::InvalidApiPort))
            .transpose()?;

        let port = port
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                K3dError::InvalidApiPort(format!("port [{}] must be between 1 and 65535", port))
            })?;

        Ok(Self {
            host: host.map(str::to_string),
            host_ip,
            port,
        })
    }

    /// Publish spec binding the API port on the host
    pub fn binding_spec(&self) -> String {
        match self.host_ip {
            Some(IpAddr::V6(ip)) => format!("[{}]:{}:{}/tcp", ip, self.port, self.port),
            Some(ip) => format!("{}:{}:{}/tcp", ip, self.port, self.port),
            None => format!("0.0.0.0:{}:{}/tcp", self.port, self.port),
        }
    }
}

impl Default for ApiPort {
    fn default() -> Self {
        Self {
            host: None,
            host_ip: None,
            port: DEFAULT_API_PORT,
        }
    }
}

impl fmt::Display for ApiPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}:{}", host, self.port),
            None => write!(f, "{}", self.port),
        }
    }
}

/// Settings of a cluster to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name
    pub name: String,
    /// k3s image
    pub image: String,
    /// Kubernetes API endpoint
    pub api_port: ApiPort,
    /// Extra arguments for `k3s server`
    #[serde(default)]
    pub server_args: Vec<String>,
    /// Extra server environment as `KEY=value`
    #[serde(default)]
    pub env: Vec<String>,
    /// Bind mounts for every node
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Publish specs
    #[serde(default)]
    pub publish: Vec<String>,
    /// Host port offset base for workers, 0 disables offsetting
    #[serde(default)]
    pub port_auto_offset: i32,
    /// Number of worker nodes
    #[serde(default)]
    pub workers: usize,
    /// Seconds to wait for the server, `Some(0)` waits forever
    pub wait: Option<u64>,
    /// Restart node containers unless stopped
    #[serde(default)]
    pub auto_restart: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLUSTER_NAME.to_string(),
            image: default_image(),
            api_port: ApiPort::default(),
            server_args: Vec::new(),
            env: Vec::new(),
            volumes: Vec::new(),
            publish: Vec::new(),
            port_auto_offset: 0,
            workers: 0,
            wait: None,
            auto_restart: false,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration for the named cluster
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set image
    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    /// Set API endpoint
    pub fn api_port(mut self, api_port: ApiPort) -> Self {
        self.api_port = api_port;
        self
    }

    /// Add a `k3s server` argument
    pub fn server_arg(mut self, arg: &str) -> Self {
        self.server_args.push(arg.to_string());
        self
    }

    /// Add environment variable
    pub fn env(mut self, entry: &str) -> Self {
        self.env.push(entry.to_string());
        self
    }

    /// Add bind mount
    pub fn volume(mut self, volume: &str) -> Self {
        self.volumes.push(volume.to_string());
        self
    }

    /// Add publish spec
    pub fn publish(mut self, spec: &str) -> Self {
        self.publish.push(spec.to_string());
        self
    }

    /// Set worker port offset
    pub fn port_auto_offset(mut self, offset: i32) -> Self {
        self.port_auto_offset = offset;
        self
    }

    /// Set number of workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Wait for the server, 0 means forever
    pub fn wait(mut self, seconds: u64) -> Self {
        self.wait = Some(seconds);
        self
    }

    /// Set auto restart
    pub fn auto_restart(mut self, auto_restart: bool) -> Self {
        self.auto_restart = auto_restart;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.name, "k3s-default");
        assert_eq!(config.image, "docker.io/rancher/k3s:latest");
        assert_eq!(config.api_port.port, 6443);
        assert_eq!(config.workers, 0);
        assert!(config.wait.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ClusterConfig::new("dev")
            .workers(2)
            .publish("80:80@workers")
            .port_auto_offset(1)
            .server_arg("--disable=traefik")
            .env("FOO=bar")
            .volume("/tmp:/tmp")
            .wait(60)
            .auto_restart(true);

        assert_eq!(config.name, "dev");
        assert_eq!(config.workers, 2);
        assert_eq!(config.publish, vec!["80:80@workers"]);
        assert_eq!(config.server_args, vec!["--disable=traefik"]);
        assert_eq!(config.volumes, vec!["/tmp:/tmp"]);
        assert_eq!(config.wait, Some(60));
        assert!(config.auto_restart);
    }

    #[test]
    fn test_normalize_image() {
        assert_eq!(normalize_image("rancher/k3s:v1.29.0-k3s1"), "docker.io/rancher/k3s:v1.29.0-k3s1");
        assert_eq!(normalize_image("k3s"), "docker.io/k3s");
        assert_eq!(normalize_image("docker.io/rancher/k3s"), "docker.io/rancher/k3s");
        assert_eq!(normalize_image("ghcr.io/me/k3s:dev"), "ghcr.io/me/k3s:dev");
        assert_eq!(normalize_image("localhost:5000/k3s"), "localhost:5000/k3s");
        assert_eq!(normalize_image("localhost/k3s"), "localhost/k3s");
    }

    #[test]
    fn test_api_port_parse() {
        let api = ApiPort::parse("6550").unwrap();
        assert_eq!(api.host, None);
        assert_eq!(api.port, 6550);
        assert_eq!(api.binding_spec(), "0.0.0.0:6550:6550/tcp");

        let api = ApiPort::parse("127.0.0.1:6443").unwrap();
        assert_eq!(api.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(api.to_string(), "127.0.0.1:6443");
        assert_eq!(api.binding_spec(), "127.0.0.1:6443:6443/tcp");

        let api = ApiPort::parse("localhost:6443").unwrap();
        assert_eq!(api.to_string(), "localhost:6443");
        assert!(api.host_ip.is_some());
        assert!(!api.binding_spec().starts_with("localhost"));
    }

    #[test]
    fn test_api_port_rejects() {
        assert!(ApiPort::parse("0").is_err());
        assert!(ApiPort::parse("70000").is_err());
        assert!(ApiPort::parse("abc").is_err());
        assert!(ApiPort::parse("a:b:c").is_err());
        assert!(ApiPort::parse("1.2.3:6443").is_err());
        assert!(matches!(
            ApiPort::parse("host.invalid:6443"),
            Err(K3dError::InvalidApiPort(_))
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ClusterConfig::new("dev").workers(1);
        let json = serde_json::to_string(&config).unwrap();
        let back: ClusterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
