//! Port publishing for cluster nodes
//!
//! A publish spec has the form `[host:][hostPort:]containerPort[/protocol][@node]*`.
//! Specs are validated and resolved against the nodes about to be created,
//! merged per node, and built into the exposed ports and host bindings of
//! each container. Workers can get their host ports shifted by an offset so
//! that several of them can publish the same container port.

pub mod mapping;
pub mod merge;
pub mod published;
pub mod resolve;
pub mod spec;
pub mod specifier;
pub mod types;

pub use mapping::{lookup_host, resolve_host, PortMapping};
pub use merge::merge;
pub use published::PublishedPorts;
pub use resolve::{resolve, NodeToPortSpecMap};
pub use spec::{parse_spec, validate_port_specs, ParsedSpec, DEFAULT_NODE_SPECIFIER};
pub use specifier::{NodeRole, NodeSpecifier, RoleGroup};
pub use types::{ContainerPort, HostAddr, Port, PortBinding, Protocol};
