//! k3d - run k3s clusters in Docker
//!
//! k3d stands up single- and multi-node k3s clusters as containers on one
//! Docker host. It provides:
//!
//! - Cluster lifecycle management (create, delete, stop, start, list)
//! - Port publishing to the host with per-node targeting
//! - Kubeconfig retrieval
//! - Image import into cluster nodes
//! - Subshells bound to a cluster

pub mod cluster;
pub mod container;
pub mod docker;
pub mod error;
pub mod hostname;
pub mod image;
pub mod network;
pub mod port;
pub mod shell;

pub use error::{K3dError, Result};
