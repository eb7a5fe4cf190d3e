//! Subshell in the context of a cluster

use crate::cluster::ClusterManager;
use crate::error::{K3dError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Set inside a cluster subshell, holds the cluster name
pub const CLUSTER_ENV: &str = "__K3D_CLUSTER__";

/// A supported interactive shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub name: &'static str,
    /// Flags that skip user rc files
    pub options: &'static [&'static str],
    /// Variable holding the prompt
    pub prompt_var: &'static str,
}

pub const SHELLS: [Shell; 2] = [
    Shell {
        name: "bash",
        options: &["--noprofile", "--norc"],
        prompt_var: "PS1",
    },
    Shell {
        name: "zsh",
        options: &["--no-rcs"],
        prompt_var: "PROMPT",
    },
];

/// Resolve `auto` through `$SHELL` and look the shell up
pub fn select_shell(requested: &str, env_shell: Option<&str>) -> Result<Shell> {
    let name = if requested == "auto" {
        env_shell
            .map(|path| {
                Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    } else {
        requested.to_string()
    };

    SHELLS
        .iter()
        .find(|shell| shell.name == name)
        .copied()
        .ok_or_else(|| K3dError::Shell(format!("selected shell [{}] is not supported", name)))
}

impl Shell {
    /// Command line arguments, with `-c command` when given
    pub fn args(&self, command: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = self.options.iter().map(|s| s.to_string()).collect();
        if let Some(command) = command.filter(|c| !c.is_empty()) {
            args.push("-c".to_string());
            args.push(command.to_string());
        }
        args
    }

    /// Variables added to the inherited environment
    pub fn env(&self, cluster: &str, kubeconfig: &Path, prompt: &str) -> Vec<(String, String)> {
        vec![
            (
                self.prompt_var.to_string(),
                format!("[{}] {}", cluster, prompt),
            ),
            (
                "KUBECONFIG".to_string(),
                kubeconfig.to_string_lossy().into_owned(),
            ),
            (CLUSTER_ENV.to_string(), cluster.to_string()),
        ]
    }
}

/// Run an interactive shell (or a single command) with the cluster's kubeconfig
pub async fn subshell(
    manager: &ClusterManager,
    cluster: &str,
    shell: &str,
    command: Option<&str>,
) -> Result<()> {
    if let Some(active) = std::env::var(CLUSTER_ENV).ok().filter(|v| !v.is_empty()) {
        return Err(K3dError::Shell(format!(
            "Already in subshell of cluster {}",
            active
        )));
    }

    let env_shell = std::env::var("SHELL").ok();
    let shell = select_shell(shell, env_shell.as_deref())?;
    let kubeconfig = manager.kubeconfig_path(cluster).await?;
    let prompt = std::env::var("PS1").unwrap_or_default();

    debug!("Starting {} for cluster {}", shell.name, cluster);
    let status = Command::new(shell.name)
        .args(shell.args(command))
        .envs(shell.env(cluster, &kubeconfig, &prompt))
        .status()
        .await
        .map_err(|e| K3dError::Shell(format!("Failed to start {}: {}", shell.name, e)))?;

    if !status.success() {
        return Err(K3dError::Shell(format!("{} exited with {}", shell.name, status)));
    }
    Ok(())
}
