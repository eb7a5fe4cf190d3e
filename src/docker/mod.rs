//! Docker engine access
//!
//! The engine is driven through the `docker` command line client. Argument
//! construction lives in [`args`] and is kept free of I/O.

pub mod args;
pub mod client;
pub mod machine;
pub mod types;

pub use client::DockerCli;
pub use machine::docker_machine_ip;
pub use types::{parse_ps_output, ContainerSummary};
