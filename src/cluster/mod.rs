//! Cluster management module
//!
//! A cluster is one k3s server container plus any number of worker
//! containers on a private network, all labelled `app=k3d` and
//! `cluster=<name>`.

pub mod config;
pub mod kubeconfig;
pub mod lifecycle;
pub mod naming;
pub mod secret;
pub mod status;

pub use config::{normalize_image, ApiPort, ClusterConfig, DEFAULT_CLUSTER_NAME};
pub use kubeconfig::ClusterDirs;
pub use lifecycle::{ClusterManager, CreatePlan};
pub use naming::{all_container_names, container_name};
pub use status::Cluster;
