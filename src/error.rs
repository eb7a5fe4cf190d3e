//! Error types for k3d

use thiserror::Error;

/// Result type for k3d operations
pub type Result<T> = std::result::Result<T, K3dError>;

/// Hostname rule violated by a cluster name or node specifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostnameRule {
    #[error("must not be empty")]
    Empty,

    #[error("must not start or end with - (dash)")]
    DashBoundary,

    #[error("contains character '{0}', only 'A-Z', 'a-z', '0-9' and '-' are allowed")]
    InvalidCharacter(char),

    #[error("is too long ({len} > {max})")]
    TooLong { len: usize, max: usize },
}

/// k3d error types
#[derive(Error, Debug)]
pub enum K3dError {
    #[error("Invalid hostname [{name}]: {rule}")]
    InvalidHostname { name: String, rule: HostnameRule },

    #[error("Invalid cluster name [{name}]: {rule}")]
    InvalidClusterName { name: String, rule: HostnameRule },

    #[error("Invalid port specification [{spec}]: {reason}")]
    InvalidPortSpec { spec: String, reason: String },

    #[error("Failed to parse port binding [{spec}]: {reason}")]
    PortParse { spec: String, reason: String },

    #[error("Invalid api port: {0}")]
    InvalidApiPort(String),

    #[error("Cluster already exists: {0}")]
    ClusterExists(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("Docker not available: {0}")]
    DockerUnavailable(String),

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(String),

    #[error("Image import error: {0}")]
    ImageImport(String),

    #[error("Shell error: {0}")]
    Shell(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),
}

impl From<serde_yaml::Error> for K3dError {
    fn from(err: serde_yaml::Error) -> Self {
        K3dError::Yaml(err.to_string())
    }
}
