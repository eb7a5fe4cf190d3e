//! Node specifier resolution

use super::spec::parse_spec;
use super::specifier::{NodeSpecifier, RoleGroup};
use crate::error::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Binding portions registered per node specifier
///
/// Duplicates are kept, dedup happens when merging for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeToPortSpecMap {
    entries: HashMap<NodeSpecifier, Vec<String>>,
}

impl NodeToPortSpecMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding portion under a specifier
    pub fn insert(&mut self, node: impl Into<NodeSpecifier>, binding: impl Into<String>) {
        self.entries
            .entry(node.into())
            .or_default()
            .push(binding.into());
    }

    pub fn get(&self, node: &NodeSpecifier) -> &[String] {
        self.entries.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn group(&self, group: RoleGroup) -> &[String] {
        self.get(&NodeSpecifier::Group(group))
    }

    pub fn named(&self, name: &str) -> &[String] {
        self.get(&NodeSpecifier::Name(name.to_string()))
    }

    pub fn contains(&self, node: &NodeSpecifier) -> bool {
        self.entries.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<NodeSpecifier>, B: Into<String>> FromIterator<(N, B)> for NodeToPortSpecMap {
    fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (node, binding) in iter {
            map.insert(node, binding);
        }
        map
    }
}

/// Map every publish spec onto the specifiers it targets
///
/// All specs are validated before anything is registered. Specifiers that
/// are neither a role keyword nor one of `created_nodes` are logged and
/// dropped; the remaining specifiers of the same spec still apply.
pub fn resolve<S: AsRef<str>>(specs: &[S], created_nodes: &[String]) -> Result<NodeToPortSpecMap> {
    let parsed = specs
        .iter()
        .map(|spec| parse_spec(spec.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let known: HashSet<&str> = created_nodes.iter().map(String::as_str).collect();
    let mut map = NodeToPortSpecMap::new();

    for spec in parsed {
        for node in spec.nodes {
            if let NodeSpecifier::Name(name) = &node {
                if !known.contains(name.as_str()) {
                    warn!(
                        "Unknown node-specifier [{}] in port mapping entry [{}]",
                        name, spec.spec
                    );
                    continue;
                }
            }
            map.insert(node, &*spec.binding);
        }
    }

    debug!("Resolved port specs for {} node specifiers", map.len());
    Ok(map)
}
