//! Exposed ports and host bindings handed to container creation

use super::mapping::PortMapping;
use super::types::{ContainerPort, PortBinding};
use crate::error::{K3dError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Exposed port set plus host bindings per container port
///
/// Every key of `bindings` is also in `exposed`. All operations return a
/// new value and leave the receiver untouched, so one set can serve as a
/// template for several workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishedPorts {
    exposed: BTreeSet<ContainerPort>,
    bindings: BTreeMap<ContainerPort, Vec<PortBinding>>,
}

impl PublishedPorts {
    /// Build from binding portions; empty input gives an empty set
    ///
    /// Hosts must be IP literals, hostnames are resolved when specs are
    /// parsed, so building never touches the resolver.
    pub fn build<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut ports = Self::default();
        for spec in specs {
            ports.insert(spec.as_ref())?;
        }
        Ok(ports)
    }

    /// Copy with one more binding merged in
    pub fn add_port(&self, spec: &str) -> Result<Self> {
        let mut ports = self.clone();
        ports.insert(spec)?;
        Ok(ports)
    }

    /// Copy with every bound host port shifted by `delta`
    ///
    /// Bindings without a host port stay engine-assigned. A shifted port
    /// outside `1..=65535` is an error. Each call checks its own result, so
    /// `p.offset(d1)?.offset(d2)?` equals `p.offset(d1 + d2)?` only while
    /// the intermediate ports stay in range; sum the deltas first when an
    /// intermediate may leave it.
    pub fn offset(&self, delta: i32) -> Result<Self> {
        let mut bindings = BTreeMap::new();
        for (container, list) in &self.bindings {
            let shifted = list
                .iter()
                .map(|binding| shift(container, binding, delta))
                .collect::<Result<Vec<_>>>()?;
            bindings.insert(*container, shifted);
        }

        Ok(Self {
            exposed: self.exposed.clone(),
            bindings,
        })
    }

    pub fn exposed(&self) -> &BTreeSet<ContainerPort> {
        &self.exposed
    }

    pub fn bindings(&self) -> &BTreeMap<ContainerPort, Vec<PortBinding>> {
        &self.bindings
    }

    pub fn bindings_for(&self, port: &ContainerPort) -> &[PortBinding] {
        self.bindings
            .get(port)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.exposed.is_empty()
    }

    /// `--publish` values, one per binding, in container port order
    pub fn publish_args(&self) -> Vec<String> {
        self.bindings
            .iter()
            .flat_map(|(container, list)| list.iter().map(|b| b.publish_arg(container)))
            .collect()
    }

    fn insert(&mut self, spec: &str) -> Result<()> {
        let parse_err = |reason: String| K3dError::PortParse {
            spec: spec.to_string(),
            reason,
        };

        let mapping: PortMapping = spec.parse().map_err(parse_err)?;
        let binding = mapping.binding().map_err(parse_err)?;

        self.exposed.insert(mapping.container);
        self.bindings
            .entry(mapping.container)
            .or_default()
            .push(binding);
        Ok(())
    }
}

fn shift(container: &ContainerPort, binding: &PortBinding, delta: i32) -> Result<PortBinding> {
    let Some(port) = binding.host_port else {
        return Ok(*binding);
    };

    let shifted = i64::from(port) + i64::from(delta);
    let host_port = u16::try_from(shifted)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| K3dError::InvalidPortSpec {
            spec: binding.publish_arg(container),
            reason: format!("host port {} offset by {} is out of range", port, delta),
        })?;

    Ok(PortBinding {
        host_port: Some(host_port),
        ..*binding
    })
}
