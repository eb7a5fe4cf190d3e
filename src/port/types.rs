//! Typed port values shared by the parser and the published-ports builder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Network protocol
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(format!("protocol [{}] must be 'tcp' or 'udp'", other)),
        }
    }
}

/// Container-side port number, always in `1..=65535`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port(u16);

impl Port {
    /// Create a port, rejecting zero
    pub fn new(port: u16) -> Option<Self> {
        (port != 0).then_some(Self(port))
    }

    /// Raw port number
    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Port {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = parse_port_number(s)?;
        Port::new(port).ok_or_else(|| "container port must be between 1 and 65535".to_string())
    }
}

/// Parse a decimal port number in `0..=65535`
pub(crate) fn parse_port_number(s: &str) -> Result<u16, String> {
    if s.contains('-') {
        return Err(format!("port ranges are not supported [{}]", s));
    }
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("port [{}] is not a number", s));
    }
    s.parse::<u16>()
        .map_err(|_| format!("port [{}] is out of range (0-65535)", s))
}

/// Exposed port key: `port/protocol`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerPort {
    pub port: Port,
    pub protocol: Protocol,
}

impl ContainerPort {
    pub fn new(port: Port, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Host side of a binding as written by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostAddr {
    /// IP literal
    Ip(IpAddr),
    /// Hostname, resolved when the binding is built
    Name(String),
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAddr::Ip(IpAddr::V6(ip)) => write!(f, "[{}]", ip),
            HostAddr::Ip(ip) => write!(f, "{}", ip),
            HostAddr::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A single host binding of a container port
///
/// `None` fields leave the choice to the container engine: no host IP means
/// all interfaces, no host port means a random free port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PortBinding {
    pub host_ip: Option<IpAddr>,
    pub host_port: Option<u16>,
}

impl PortBinding {
    /// Render as a `--publish` value for the given container port
    pub fn publish_arg(&self, container: &ContainerPort) -> String {
        let host_port = self.host_port.map(|p| p.to_string()).unwrap_or_default();
        match self.host_ip {
            Some(IpAddr::V6(ip)) => format!("[{}]:{}:{}", ip, host_port, container),
            Some(ip) => format!("{}:{}:{}", ip, host_port, container),
            None if self.host_port.is_some() => format!("{}:{}", host_port, container),
            None => container.to_string(),
        }
    }
}
