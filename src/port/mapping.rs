//! Binding grammar: `[host:][hostPort:]containerPort[/protocol]`

use super::types::{parse_port_number, ContainerPort, HostAddr, Port, PortBinding, Protocol};
use regex::Regex;
use std::fmt;
use std::net::{IpAddr, Ipv6Addr, ToSocketAddrs};
use std::str::FromStr;
use std::sync::OnceLock;

/// RFC 1123 hostname, dots allowed
fn dns_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        )
        .unwrap()
    })
}

/// Look up a hostname with the system resolver, preferring IPv4
pub fn resolve_host(name: &str) -> Option<IpAddr> {
    let addrs: Vec<IpAddr> = (name, 0)
        .to_socket_addrs()
        .ok()?
        .map(|addr| addr.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

/// True when the last label is a number, which resolvers read as an IPv4
/// shorthand (`1.2.3`, `0x7f.1`) instead of a hostname
fn is_numeric_name(host: &str) -> bool {
    let label = host.rsplit('.').next().unwrap_or_default();
    let hex = label
        .strip_prefix("0x")
        .or_else(|| label.strip_prefix("0X"));
    match hex {
        Some(digits) => digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => label.bytes().all(|b| b.is_ascii_digit()),
    }
}

fn parse_host(host: &str) -> Result<Option<HostAddr>, String> {
    if host.is_empty() {
        return Ok(None);
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(Some(HostAddr::Ip(ip)));
    }
    if dns_name_regex().is_match(host) && !is_numeric_name(host) {
        return Ok(Some(HostAddr::Name(host.to_string())));
    }
    Err(format!(
        "host [{}] is neither an IP address nor a valid hostname",
        host
    ))
}

/// Parse a host and look it up once, IP literals are returned as is
pub fn lookup_host(host: &str) -> Result<IpAddr, String> {
    match parse_host(host)? {
        Some(HostAddr::Ip(ip)) => Ok(ip),
        Some(HostAddr::Name(name)) => {
            resolve_host(&name).ok_or_else(|| format!("host [{}] cannot be resolved", name))
        }
        None => Err("host must not be empty".to_string()),
    }
}

/// A parsed binding portion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host: Option<HostAddr>,
    pub host_port: Option<u16>,
    pub container: ContainerPort,
}

impl PortMapping {
    /// Copy with a hostname replaced by the address it resolves to
    pub fn resolved(&self) -> Result<Self, String> {
        let host = match &self.host {
            Some(HostAddr::Name(name)) => Some(HostAddr::Ip(lookup_host(name)?)),
            other => other.clone(),
        };
        Ok(Self {
            host,
            ..self.clone()
        })
    }

    /// Turn the mapping into an engine binding
    ///
    /// Only IP literals are accepted as host, names must go through
    /// [`resolved`](Self::resolved) first.
    pub fn binding(&self) -> Result<PortBinding, String> {
        let host_ip = match &self.host {
            None => None,
            Some(HostAddr::Ip(ip)) => Some(*ip),
            Some(HostAddr::Name(name)) => {
                return Err(format!("host [{}] is not an IP address", name))
            }
        };

        Ok(PortBinding {
            host_ip,
            host_port: self.host_port,
        })
    }
}

fn parse_host_port(port: &str) -> Result<Option<u16>, String> {
    if port.is_empty() {
        return Ok(None);
    }
    // 0 lets the engine pick, same as leaving it out
    Ok(Some(parse_port_number(port)?).filter(|p| *p != 0))
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty port specification".to_string());
        }

        let (rest, protocol) = match s.rsplit_once('/') {
            Some((rest, proto)) => (rest, proto.parse::<Protocol>()?),
            None => (s, Protocol::default()),
        };

        let (bracketed, rest) = match rest.strip_prefix('[') {
            Some(inner) => {
                let (ip, after) = inner
                    .split_once(']')
                    .ok_or_else(|| "unterminated '[' in host address".to_string())?;
                let ip: Ipv6Addr = ip
                    .parse()
                    .map_err(|_| format!("[{}] is not a valid IPv6 address", ip))?;
                let after = after
                    .strip_prefix(':')
                    .ok_or_else(|| "expected ':' after bracketed host address".to_string())?;
                (Some(HostAddr::Ip(IpAddr::V6(ip))), after)
            }
            None => (None, rest),
        };

        let parts: Vec<&str> = rest.split(':').collect();
        let (host, host_port, container) = match (bracketed, parts.as_slice()) {
            (None, [container]) => (None, "", *container),
            (None, [host_port, container]) => (None, *host_port, *container),
            (None, [host, host_port, container]) => (parse_host(host)?, *host_port, *container),
            (Some(host), [host_port, container]) => (Some(host), *host_port, *container),
            _ => {
                return Err(
                    "expected [host:][hostPort:]containerPort, IPv6 hosts must be bracketed"
                        .to_string(),
                )
            }
        };

        if container.is_empty() {
            return Err("container port is required".to_string());
        }
        let port: Port = container.parse()?;

        Ok(Self {
            host,
            host_port: parse_host_port(host_port)?,
            container: ContainerPort::new(port, protocol),
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host_port = self.host_port.map(|p| p.to_string()).unwrap_or_default();
        match &self.host {
            Some(host) => write!(f, "{}:{}:{}", host, host_port, self.container),
            None if self.host_port.is_some() => write!(f, "{}:{}", host_port, self.container),
            None => write!(f, "{}", self.container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_port_only() {
        let mapping: PortMapping = "80".parse().unwrap();
        assert_eq!(mapping.host, None);
        assert_eq!(mapping.host_port, None);
        assert_eq!(mapping.container.port.get(), 80);
        assert_eq!(mapping.container.protocol, Protocol::Tcp);
    }

    #[test]
    fn test_full_binding() {
        let mapping: PortMapping = "0.0.0.0:6443:6443/tcp".parse().unwrap();
        assert_eq!(
            mapping.host,
            Some(HostAddr::Ip("0.0.0.0".parse().unwrap()))
        );
        assert_eq!(mapping.host_port, Some(6443));
        assert_eq!(mapping.container.to_string(), "6443/tcp");
    }

    #[test]
    fn test_udp_and_host_port() {
        let mapping: PortMapping = "9090:9091/udp".parse().unwrap();
        assert_eq!(mapping.host_port, Some(9090));
        assert_eq!(mapping.container.port.get(), 9091);
        assert_eq!(mapping.container.protocol, Protocol::Udp);
    }

    #[test]
    fn test_bracketed_ipv6() {
        let mapping: PortMapping = "[::1]:8080:80".parse().unwrap();
        assert_eq!(mapping.host, Some(HostAddr::Ip("::1".parse().unwrap())));
        assert_eq!(mapping.to_string(), "[::1]:8080:80/tcp");

        assert!("::1:8080:80".parse::<PortMapping>().is_err());
        assert!("[::1:8080:80".parse::<PortMapping>().is_err());
    }

    #[test]
    fn test_hostname_host() {
        let mapping: PortMapping = "localhost:8080:80".parse().unwrap();
        assert_eq!(mapping.host, Some(HostAddr::Name("localhost".to_string())));
        assert!(mapping.binding().is_err());

        let resolved = mapping.resolved().unwrap();
        assert!(matches!(resolved.host, Some(HostAddr::Ip(_))));
        assert_eq!(resolved.host_port, Some(8080));
        assert!(resolved.binding().is_ok());

        assert!("bad_host!:8080:80".parse::<PortMapping>().is_err());
    }

    #[test]
    fn test_numeric_names_rejected() {
        for spec in ["1.2.3:8080:80", "10.0.0.256:80:80", "123:80:80", "0x7f.1:80:80"] {
            let err = spec.parse::<PortMapping>().unwrap_err();
            assert!(err.contains("neither an IP address"), "{spec}: {err}");
        }
        assert!(lookup_host("1.2.3").is_err());
        assert_eq!(lookup_host("10.1.2.3").unwrap().to_string(), "10.1.2.3");
    }

    #[test]
    fn test_resolved_keeps_ip_literal() {
        let mapping: PortMapping = "[::1]:8080:80/udp".parse().unwrap();
        assert_eq!(mapping.resolved().unwrap(), mapping);
    }

    #[test]
    fn test_empty_host_and_host_port() {
        let mapping: PortMapping = "127.0.0.1::80".parse().unwrap();
        assert_eq!(mapping.host_port, None);

        let mapping: PortMapping = "0:80".parse().unwrap();
        assert_eq!(mapping.host_port, None);
    }

    #[test]
    fn test_rejections() {
        let err = "99999:80".parse::<PortMapping>().unwrap_err();
        assert!(err.contains("out of range"));

        assert!("80:0".parse::<PortMapping>().is_err());
        assert!("80:".parse::<PortMapping>().is_err());
        assert!("".parse::<PortMapping>().is_err());
        assert!("80/sctp".parse::<PortMapping>().is_err());
        assert!("80:80/TCP".parse::<PortMapping>().is_err());
        assert!("8000-8010:80".parse::<PortMapping>().is_err());
        assert!("a:b:c:d".parse::<PortMapping>().is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let mapping: PortMapping = "8080:80".parse().unwrap();
        assert_eq!(mapping.to_string(), "8080:80/tcp");

        let mapping: PortMapping = "80/udp".parse().unwrap();
        assert_eq!(mapping.to_string(), "80/udp");
    }

    #[test]
    fn test_binding_resolves_ip_literal() {
        let mapping: PortMapping = "10.0.0.1:80:80".parse().unwrap();
        let binding = mapping.binding().unwrap();
        assert_eq!(binding.host_ip, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(binding.host_port, Some(80));
    }
}
