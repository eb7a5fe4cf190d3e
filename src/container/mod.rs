//! Node container definitions
//!
//! Labels, state and run configuration of the containers that make up a
//! cluster. Running them is left to [`crate::docker::DockerCli`].

pub mod config;

pub use config::{
    node_labels, ContainerState, NodeContainerConfig, APP_NAME, LABEL_APP, LABEL_CLUSTER,
    LABEL_COMPONENT, LABEL_CREATED,
};
