//! Hostname rules for cluster names and node specifiers

use crate::error::{HostnameRule, K3dError, Result};

/// Longest accepted cluster name, leaves room for role and index suffixes
pub const CLUSTER_NAME_MAX_LEN: usize = 35;

fn check_rules(name: &str) -> std::result::Result<(), HostnameRule> {
    if name.is_empty() {
        return Err(HostnameRule::Empty);
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(HostnameRule::DashBoundary);
    }
    match name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
        Some(c) => Err(HostnameRule::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// Validate a single hostname label: `[A-Za-z0-9-]`, no leading or trailing dash
pub fn validate_hostname(name: &str) -> Result<()> {
    check_rules(name).map_err(|rule| K3dError::InvalidHostname {
        name: name.to_string(),
        rule,
    })
}

/// Validate a cluster name: hostname rules plus a length cap
pub fn check_cluster_name(name: &str) -> Result<()> {
    let invalid = |rule: HostnameRule| K3dError::InvalidClusterName {
        name: name.to_string(),
        rule,
    };

    check_rules(name).map_err(invalid)?;
    if name.len() > CLUSTER_NAME_MAX_LEN {
        return Err(invalid(HostnameRule::TooLong {
            len: name.len(),
            max: CLUSTER_NAME_MAX_LEN,
        }));
    }
    Ok(())
}
