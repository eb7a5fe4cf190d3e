//! Publish spec parsing: `binding(@node-specifier)*`

use super::mapping::PortMapping;
use super::specifier::{NodeSpecifier, RoleGroup};
use super::types::HostAddr;
use crate::error::{K3dError, Result};
use crate::hostname::validate_hostname;
use std::borrow::Cow;

/// Target used when a spec carries no `@` suffix
pub const DEFAULT_NODE_SPECIFIER: RoleGroup = RoleGroup::Server;

/// A validated publish spec split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpec<'a> {
    /// Full spec as given by the user
    pub spec: &'a str,
    /// Binding portion, everything before the first `@`
    ///
    /// A hostname is replaced by the address it resolved to, so the stored
    /// binding never needs another lookup.
    pub binding: Cow<'a, str>,
    /// Node specifiers in the order given, never empty
    pub nodes: Vec<NodeSpecifier>,
}

/// Parse and validate a single publish spec
///
/// The binding portion must follow the binding grammar, and every node
/// specifier must be a valid hostname label. A hostname in the binding is
/// looked up here, once; this is the only place the port subsystem touches
/// the resolver.
pub fn parse_spec(spec: &str) -> Result<ParsedSpec<'_>> {
    let invalid = |reason: String| K3dError::InvalidPortSpec {
        spec: spec.to_string(),
        reason,
    };

    let mut parts = spec.split('@');
    let raw = parts.next().unwrap_or_default();
    let binding_err = |reason: String| invalid(format!("binding [{}]: {}", raw, reason));

    let mapping: PortMapping = raw.parse().map_err(binding_err)?;
    let binding = match mapping.host {
        Some(HostAddr::Name(_)) => {
            let resolved = mapping.resolved().map_err(binding_err)?;
            Cow::Owned(resolved.to_string())
        }
        _ => Cow::Borrowed(raw),
    };

    let mut nodes = Vec::new();
    for node in parts {
        if let Err(K3dError::InvalidHostname { rule, .. }) = validate_hostname(node) {
            return Err(invalid(format!("node-specifier [{}] {}", node, rule)));
        }
        nodes.push(NodeSpecifier::from(node));
    }

    if nodes.is_empty() {
        nodes.push(NodeSpecifier::Group(DEFAULT_NODE_SPECIFIER));
    }

    Ok(ParsedSpec {
        spec,
        binding,
        nodes,
    })
}

/// Validate every spec, stopping at the first failure
pub fn validate_port_specs<S: AsRef<str>>(specs: &[S]) -> Result<()> {
    for spec in specs {
        parse_spec(spec.as_ref())?;
    }
    Ok(())
}
