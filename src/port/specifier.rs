//! Node specifiers and the role group table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role keyword usable after `@` in a publish spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleGroup {
    All,
    Server,
    Master,
    Workers,
}

impl RoleGroup {
    pub const ALL: [RoleGroup; 4] = [
        RoleGroup::All,
        RoleGroup::Server,
        RoleGroup::Master,
        RoleGroup::Workers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleGroup::All => "all",
            RoleGroup::Server => "server",
            RoleGroup::Master => "master",
            RoleGroup::Workers => "workers",
        }
    }

    /// Match a keyword exactly, keywords are case sensitive
    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

impl fmt::Display for RoleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target of a publish spec: a role group or a concrete container name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeSpecifier {
    Group(RoleGroup),
    Name(String),
}

impl From<&str> for NodeSpecifier {
    fn from(s: &str) -> Self {
        match RoleGroup::from_keyword(s) {
            Some(group) => NodeSpecifier::Group(group),
            None => NodeSpecifier::Name(s.to_string()),
        }
    }
}

impl From<RoleGroup> for NodeSpecifier {
    fn from(group: RoleGroup) -> Self {
        NodeSpecifier::Group(group)
    }
}

impl fmt::Display for NodeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSpecifier::Group(group) => write!(f, "{}", group),
            NodeSpecifier::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Role of a node container in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Server,
    Worker,
}

impl NodeRole {
    /// Groups whose specs apply to this role, in merge order
    pub const fn groups(self) -> &'static [RoleGroup] {
        match self {
            NodeRole::Server => &[RoleGroup::All, RoleGroup::Server, RoleGroup::Master],
            NodeRole::Worker => &[RoleGroup::All, RoleGroup::Workers],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Server => "server",
            NodeRole::Worker => "worker",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(RoleGroup::from_keyword("all"), Some(RoleGroup::All));
        assert_eq!(RoleGroup::from_keyword("master"), Some(RoleGroup::Master));
        assert_eq!(RoleGroup::from_keyword("worker"), None);
        assert_eq!(RoleGroup::from_keyword("Server"), None);
    }

    #[test]
    fn test_specifier_from_str() {
        assert_eq!(
            NodeSpecifier::from("workers"),
            NodeSpecifier::Group(RoleGroup::Workers)
        );
        assert_eq!(
            NodeSpecifier::from("k3d-c-worker-0"),
            NodeSpecifier::Name("k3d-c-worker-0".to_string())
        );
        assert_eq!(NodeSpecifier::from("server").to_string(), "server");
    }

    #[test]
    fn test_role_groups_table() {
        assert_eq!(
            NodeRole::Server.groups(),
            &[RoleGroup::All, RoleGroup::Server, RoleGroup::Master]
        );
        assert_eq!(
            NodeRole::Worker.groups(),
            &[RoleGroup::All, RoleGroup::Workers]
        );
    }
}
