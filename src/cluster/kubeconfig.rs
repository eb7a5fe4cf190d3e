//! Cluster directories and kubeconfig handling

use crate::error::{K3dError, Result};
use serde_yaml::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Kubeconfig written by the k3s server inside its container
pub const KUBECONFIG_CONTAINER_PATH: &str = "/output/kubeconfig.yaml";
/// Kubeconfig file name inside a cluster directory
pub const KUBECONFIG_FILE: &str = "kubeconfig.yaml";
/// Image tarball directory inside a cluster directory
pub const IMAGES_DIR: &str = "images";

/// Per-cluster directories under `$HOME/.config/k3d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDirs {
    root: PathBuf,
}

impl ClusterDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$HOME/.config/k3d`
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            K3dError::InvalidConfig("couldn't determine the user's home directory".to_string())
        })?;
        Ok(Self::new(home.join(".config").join("k3d")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cluster_dir(&self, cluster: &str) -> PathBuf {
        self.root.join(cluster)
    }

    pub fn kubeconfig_path(&self, cluster: &str) -> PathBuf {
        self.cluster_dir(cluster).join(KUBECONFIG_FILE)
    }

    pub fn images_dir(&self, cluster: &str) -> PathBuf {
        self.cluster_dir(cluster).join(IMAGES_DIR)
    }

    /// Create the cluster directory and its image directory
    pub fn create(&self, cluster: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(self.images_dir(cluster))?;
        Ok(self.cluster_dir(cluster))
    }

    /// Remove the cluster directory, a failure is only logged
    pub fn remove(&self, cluster: &str) {
        let dir = self.cluster_dir(cluster);
        if !dir.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            warn!(
                "Couldn't delete cluster directory [{}], you might want to delete it manually: {}",
                dir.display(),
                e
            );
        }
    }
}

/// Read the kubeconfig out of the tar stream of a container copy
pub fn extract_kubeconfig(archive: &[u8]) -> Result<String> {
    let mut archive = tar::Archive::new(archive);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        return Ok(content.trim_end_matches('\0').to_string());
    }
    Err(K3dError::Kubeconfig(
        "no kubeconfig file in copied archive".to_string(),
    ))
}

/// Point every `clusters[].cluster.server` URL at `host`, keeping scheme and port
pub fn rewrite_server_host(kubeconfig: &str, host: &str) -> Result<String> {
    let mut doc: Value = serde_yaml::from_str(kubeconfig)?;

    let clusters = doc
        .get_mut("clusters")
        .and_then(Value::as_sequence_mut)
        .ok_or_else(|| K3dError::Kubeconfig("kubeconfig has no clusters".to_string()))?;

    for entry in clusters.iter_mut() {
        let Some(server) = entry.get_mut("cluster").and_then(|c| c.get_mut("server")) else {
            continue;
        };
        if let Some(url) = server.as_str() {
            *server = Value::String(replace_url_host(url, host));
        }
    }

    Ok(serde_yaml::to_string(&doc)?)
}

fn replace_url_host(url: &str, host: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };

    let port = if rest.starts_with('[') {
        rest.split_once("]:").map(|(_, port)| port)
    } else {
        rest.rsplit_once(':').map(|(_, port)| port)
    };

    let authority = match port {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    match scheme {
        Some(scheme) => format!("{}://{}", scheme, authority),
        None => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KUBECONFIG: &str = "apiVersion: v1
clusters:
- cluster:
    certificate-authority-data: AAAA
    server: https://127.0.0.1:6443
  name: default
contexts:
- context:
    cluster: default
    user: default
  name: default
current-context: default
kind: Config
";

    fn tar_of(name: &str, content: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o600);
        header.set_cksum();
        builder.append_data(&mut header, name, content).unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_cluster_dirs() {
        let tmp = tempdir().unwrap();
        let dirs = ClusterDirs::new(tmp.path());

        assert_eq!(
            dirs.kubeconfig_path("dev"),
            tmp.path().join("dev").join("kubeconfig.yaml")
        );

        dirs.create("dev").unwrap();
        assert!(dirs.images_dir("dev").is_dir());

        dirs.remove("dev");
        assert!(!dirs.cluster_dir("dev").exists());

        // removing twice is fine
        dirs.remove("dev");
    }

    #[test]
    fn test_extract_kubeconfig() {
        let archive = tar_of("kubeconfig.yaml", KUBECONFIG.as_bytes());
        assert_eq!(extract_kubeconfig(&archive).unwrap(), KUBECONFIG);
    }

    #[test]
    fn test_extract_empty_archive() {
        let archive = tar::Builder::new(Vec::new()).into_inner().unwrap();
        assert!(matches!(
            extract_kubeconfig(&archive),
            Err(K3dError::Kubeconfig(_))
        ));
    }

    #[test]
    fn test_rewrite_server_host() {
        let rewritten = rewrite_server_host(KUBECONFIG, "192.168.99.100").unwrap();
        let doc: Value = serde_yaml::from_str(&rewritten).unwrap();
        assert_eq!(
            doc["clusters"][0]["cluster"]["server"].as_str(),
            Some("https://192.168.99.100:6443")
        );
        assert_eq!(doc["current-context"].as_str(), Some("default"));
    }

    #[test]
    fn test_rewrite_requires_clusters() {
        assert!(rewrite_server_host("kind: Config\n", "1.2.3.4").is_err());
        assert!(rewrite_server_host(": : :", "1.2.3.4").is_err());
    }

    #[test]
    fn test_replace_url_host() {
        assert_eq!(replace_url_host("https://127.0.0.1:6443", "h"), "https://h:6443");
        assert_eq!(replace_url_host("https://[::1]:6443", "h"), "https://h:6443");
        assert_eq!(replace_url_host("https://localhost", "h"), "https://h");
    }
}
