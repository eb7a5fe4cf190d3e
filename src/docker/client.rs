//! Async wrapper around the `docker` CLI

use super::args;
use super::types::{parse_ps_output, ContainerSummary};
use crate::container::NodeContainerConfig;
use crate::error::{K3dError, Result};
use crate::network::ClusterNetwork;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

/// Docker engine reached through its command line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }

    /// Use a different client binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    async fn output(&self, args: &[String]) -> Result<Output> {
        debug!("Running {} {}", self.binary, args.join(" "));
        Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| K3dError::DockerUnavailable(format!("Failed to run {}: {}", self.binary, e)))
    }

    /// Run and return stdout, failing with stderr on a non-zero exit
    async fn run(&self, args: &[String]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(K3dError::Docker(format!(
                "docker {} failed: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Engine API version
    pub async fn version(&self) -> Result<String> {
        let output = self.output(&args::version_args()).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(K3dError::DockerUnavailable(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Create and start a container, returning its ID
    pub async fn run_container(&self, config: &NodeContainerConfig) -> Result<String> {
        let stdout = self.run(&args::run_args(config)).await?;
        Ok(stdout.trim().to_string())
    }

    /// Containers carrying all of the given labels, stopped ones included
    pub async fn list_containers(&self, labels: &[(&str, &str)]) -> Result<Vec<ContainerSummary>> {
        let stdout = self.run(&args::ps_args(labels, true)).await?;
        parse_ps_output(&stdout)
    }

    pub async fn start(&self, id: &str) -> Result<()> {
        self.run(&args::start_args(id)).await.map(drop)
    }

    pub async fn stop(&self, id: &str) -> Result<()> {
        self.run(&args::stop_args(id)).await.map(drop)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.run(&args::rm_args(id)).await.map(drop)
    }

    /// Container logs, stdout and stderr combined
    pub async fn logs(&self, id: &str) -> Result<String> {
        let output = self.output(&args::logs_args(id)).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(K3dError::Docker(format!(
                "couldn't get logs for {}: {}",
                id,
                stderr.trim()
            )));
        }
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }

    /// Tar stream of a path inside a container
    pub async fn copy_from(&self, id: &str, path: &str) -> Result<Vec<u8>> {
        let output = self.output(&args::cp_from_args(id, path)).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(K3dError::Docker(format!(
                "couldn't copy {} from {}: {}",
                path,
                id,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Run a command in a container, returning stdout
    pub async fn exec(&self, id: &str, cmd: &[&str]) -> Result<String> {
        self.run(&args::exec_args(id, cmd)).await
    }

    pub async fn create_network(&self, network: &ClusterNetwork) -> Result<String> {
        let stdout = self.run(&args::network_create_args(network)).await?;
        Ok(stdout.trim().to_string())
    }

    /// Remove every network matching the cluster network labels
    ///
    /// Failures on single networks are logged and skipped.
    pub async fn remove_networks(&self, network: &ClusterNetwork) -> Result<()> {
        let stdout = self.run(&args::network_ls_args(network)).await?;
        for id in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Err(e) = self.run(&args::network_rm_args(id)).await {
                warn!("Couldn't remove network for cluster {}: {}", network.name, e);
            }
        }
        Ok(())
    }

    pub async fn save_image(&self, image: &str, output: &Path) -> Result<()> {
        let output = output.to_string_lossy();
        self.run(&args::save_args(image, &output)).await.map(drop)
    }
}
