//! Cluster lifecycle management

use super::config::{normalize_image, ClusterConfig, DEFAULT_SERVER_COUNT};
use super::kubeconfig::{
    extract_kubeconfig, rewrite_server_host, ClusterDirs, KUBECONFIG_CONTAINER_PATH,
};
use super::naming::{all_container_names, server_name, worker_name};
use super::secret::cluster_secret_env;
use super::status::Cluster;
use crate::container::{
    node_labels, NodeContainerConfig, APP_NAME, LABEL_APP, LABEL_CLUSTER, LABEL_COMPONENT,
};
use crate::docker::{docker_machine_ip, DockerCli};
use crate::error::{K3dError, Result};
use crate::hostname::check_cluster_name;
use crate::network::ClusterNetwork;
use crate::port::{merge, resolve, NodeRole, NodeToPortSpecMap, PublishedPorts};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Log line printed by k3s once the node is up
pub const SERVER_READY_MESSAGE: &str = "Running kubelet";
/// Mount point of the cluster image directory in every node
pub const IMAGES_MOUNT: &str = "/images";

const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Node containers of a cluster, computed before anything is created
///
/// Building the plan validates the cluster name and every publish spec,
/// so a bad spec aborts creation before any engine object exists.
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub cluster: String,
    pub image: String,
    pub server_name: String,
    /// `K3S_CLUSTER_SECRET` and `K3S_TOKEN`, only when there are workers
    pub secrets: Vec<String>,
    pub port_map: NodeToPortSpecMap,
    /// User volumes plus the image directory mount
    pub volumes: Vec<String>,
    /// Extra TLS SAN for the API certificate
    pub tls_san: Option<String>,
}

impl CreatePlan {
    pub fn new(config: &ClusterConfig, dirs: &ClusterDirs, tls_san: Option<String>) -> Result<Self> {
        check_cluster_name(&config.name)?;

        let names = all_container_names(&config.name, DEFAULT_SERVER_COUNT, config.workers);
        let port_map = resolve(&config.publish, &names)?;

        let secrets = if config.workers > 0 {
            cluster_secret_env()
        } else {
            Vec::new()
        };

        let mut volumes = config.volumes.clone();
        volumes.push(format!(
            "{}:{}",
            dirs.images_dir(&config.name).display(),
            IMAGES_MOUNT
        ));

        Ok(Self {
            cluster: config.name.clone(),
            image: normalize_image(&config.image),
            server_name: server_name(&config.name, 0, DEFAULT_SERVER_COUNT),
            secrets,
            port_map,
            volumes,
            tls_san,
        })
    }

    fn node(&self, name: &str, role: NodeRole, auto_restart: bool) -> NodeContainerConfig {
        let node = NodeContainerConfig::new(name, &self.image)
            .labels(node_labels(role, &self.cluster))
            .volumes(&self.volumes)
            .privileged(true)
            .network(&self.cluster, name);

        if auto_restart {
            node.restart("unless-stopped")
        } else {
            node
        }
    }

    /// The k3s server container
    pub fn server_container(&self, config: &ClusterConfig) -> Result<NodeContainerConfig> {
        let api_port = config.api_port.port.to_string();

        let mut cmd = vec![
            "server".to_string(),
            "--https-listen-port".to_string(),
            api_port,
        ];
        if let Some(ref san) = self.tls_san {
            cmd.push("--tls-san".to_string());
            cmd.push(san.clone());
        }
        cmd.extend(config.server_args.iter().cloned());

        let specs = merge(&self.port_map, NodeRole::Server, &self.server_name);
        let ports = PublishedPorts::build(&specs)?.add_port(&config.api_port.binding_spec())?;

        Ok(self
            .node(&self.server_name, NodeRole::Server, config.auto_restart)
            .cmd(cmd)
            .env(format!("K3S_KUBECONFIG_OUTPUT={}", KUBECONFIG_CONTAINER_PATH))
            .envs(config.env.iter().cloned())
            .envs(self.secrets.iter().cloned())
            .ports(ports))
    }

    /// The `index`-th worker container, host ports offset when configured
    pub fn worker_container(&self, config: &ClusterConfig, index: usize) -> Result<NodeContainerConfig> {
        let name = worker_name(&self.cluster, index);

        let specs = merge(&self.port_map, NodeRole::Worker, &name);
        let mut ports = PublishedPorts::build(&specs)?;
        if config.port_auto_offset != 0 {
            let delta = i32::try_from(index)
                .ok()
                .and_then(|i| i.checked_add(config.port_auto_offset))
                .ok_or_else(|| {
                    K3dError::InvalidConfig(format!("port offset overflows for worker {}", index))
                })?;
            ports = ports.offset(delta)?;
        }

        Ok(self
            .node(&name, NodeRole::Worker, config.auto_restart)
            .cmd(vec!["agent".to_string()])
            .envs(self.secrets.iter().cloned())
            .env(format!(
                "K3S_URL=https://{}:{}",
                self.server_name, config.api_port.port
            ))
            .tmpfs("/run")
            .tmpfs("/var/run")
            .ports(ports))
    }
}

/// Creates, inspects and tears down clusters on the engine
#[derive(Debug, Clone)]
pub struct ClusterManager {
    docker: DockerCli,
    dirs: ClusterDirs,
}

impl ClusterManager {
    pub fn new(docker: DockerCli, dirs: ClusterDirs) -> Self {
        Self { docker, dirs }
    }

    pub fn docker(&self) -> &DockerCli {
        &self.docker
    }

    pub fn dirs(&self) -> &ClusterDirs {
        &self.dirs
    }

    /// Verify the engine answers, returning its API version
    pub async fn check_tools(&self) -> Result<String> {
        info!("Checking docker...");
        let version = self.docker.version().await?;
        info!("Checking docker succeeded (API: v{})", version);
        Ok(version)
    }

    async fn machine_ip(&self) -> Option<String> {
        match docker_machine_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Couldn't get docker-machine IP: {}", e);
                None
            }
        }
    }

    /// Clusters on the engine, all of them or the one named `name`
    pub async fn clusters(&self, all: bool, name: &str) -> Result<Vec<Cluster>> {
        let servers = self
            .docker
            .list_containers(&[
                (LABEL_APP, APP_NAME),
                (LABEL_COMPONENT, NodeRole::Server.as_str()),
            ])
            .await?;

        let mut clusters = Vec::new();
        for server in servers {
            let Some(cluster_name) = server.label(LABEL_CLUSTER).map(str::to_string) else {
                continue;
            };
            if !all && cluster_name != name {
                continue;
            }

            let workers = self
                .docker
                .list_containers(&[
                    (LABEL_APP, APP_NAME),
                    (LABEL_COMPONENT, NodeRole::Worker.as_str()),
                    (LABEL_CLUSTER, cluster_name.as_str()),
                ])
                .await
                .unwrap_or_else(|e| {
                    warn!("Couldn't get worker containers for cluster {}: {}", cluster_name, e);
                    Vec::new()
                });

            clusters.push(Cluster::new(&cluster_name, server, workers));
        }

        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clusters)
    }

    /// Like [`clusters`](Self::clusters) but a missing named cluster is an error
    async fn select(&self, all: bool, name: &str) -> Result<Vec<Cluster>> {
        let clusters = self.clusters(all, name).await?;
        if !all && clusters.is_empty() {
            return Err(K3dError::ClusterNotFound(name.to_string()));
        }
        Ok(clusters)
    }

    /// Create a cluster, removing whatever was created if a step fails
    pub async fn create(&self, config: &ClusterConfig) -> Result<()> {
        let tls_san = self.machine_ip().await;
        let plan = CreatePlan::new(config, &self.dirs, tls_san)?;

        if !self.clusters(false, &config.name).await?.is_empty() {
            return Err(K3dError::ClusterExists(config.name.clone()));
        }

        let network = ClusterNetwork::for_cluster(&config.name);
        let network_id = self.docker.create_network(&network).await?;
        info!("Created cluster network with ID {}", network_id);

        info!("Creating cluster [{}]", config.name);
        if let Err(e) = self.create_nodes(config, &plan).await {
            error!("Failed to create cluster [{}]: {}", config.name, e);
            self.remove_partial(&config.name).await;
            return Err(e);
        }

        info!("Created cluster [{}]", config.name);
        Ok(())
    }

    async fn create_nodes(&self, config: &ClusterConfig, plan: &CreatePlan) -> Result<()> {
        self.dirs.create(&config.name)?;

        info!("Creating server using {}...", plan.image);
        let server = plan.server_container(config)?;
        let server_id = self.docker.run_container(&server).await?;
        debug!("Server container {} has ID {}", server.name, server_id);

        if let Some(timeout) = config.wait {
            self.wait_for_server(&server_id, timeout).await?;
        }

        if config.workers > 0 {
            info!(
                "Booting {} workers for cluster {}",
                config.workers, config.name
            );
        }
        for index in 0..config.workers {
            let worker = plan.worker_container(config, index)?;
            let worker_id = self.docker.run_container(&worker).await?;
            info!("Created worker with ID {}", worker_id);
        }

        Ok(())
    }

    /// Poll server logs until k3s reports readiness, 0 waits forever
    pub async fn wait_for_server(&self, id: &str, timeout_secs: u64) -> Result<()> {
        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        loop {
            if timeout_secs != 0 && start.elapsed() >= timeout {
                return Err(K3dError::Timeout(
                    "cluster creation exceeded specified timeout".to_string(),
                ));
            }

            let logs = self.docker.logs(id).await?;
            if logs.contains(SERVER_READY_MESSAGE) {
                debug!("Server {} is ready after {:?}", id, start.elapsed());
                return Ok(());
            }

            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    /// Remove every object of a half-created cluster, failures are only logged
    async fn remove_partial(&self, name: &str) {
        let labels = [(LABEL_APP, APP_NAME), (LABEL_CLUSTER, name)];
        match self.docker.list_containers(&labels).await {
            Ok(containers) => {
                for container in containers {
                    if let Err(e) = self.docker.remove(&container.id).await {
                        warn!("Couldn't remove container {}: {}", container.name(), e);
                    }
                }
            }
            Err(e) => warn!("Couldn't list containers of cluster {}: {}", name, e),
        }

        if let Err(e) = self
            .docker
            .remove_networks(&ClusterNetwork::for_cluster(name))
            .await
        {
            warn!("Couldn't delete cluster network for cluster {}: {}", name, e);
        }

        self.dirs.remove(name);
    }

    /// Delete clusters with their network and directory
    pub async fn delete(&self, all: bool, name: &str) -> Result<()> {
        for cluster in self.select(all, name).await? {
            info!("Removing cluster [{}]", cluster.name);

            if !cluster.workers.is_empty() {
                info!("...Removing {} workers", cluster.workers.len());
            }
            for worker in &cluster.workers {
                if let Err(e) = self.docker.remove(&worker.id).await {
                    warn!("{}", e);
                }
            }

            info!("...Removing server");
            self.dirs.remove(&cluster.name);
            self.docker.remove(&cluster.server.id).await.map_err(|e| {
                K3dError::Docker(format!(
                    "Couldn't remove server for cluster {}: {}",
                    cluster.name, e
                ))
            })?;

            info!("...Removing cluster network");
            if let Err(e) = self
                .docker
                .remove_networks(&ClusterNetwork::for_cluster(&cluster.name))
                .await
            {
                warn!(
                    "Couldn't delete cluster network for cluster {}: {}",
                    cluster.name, e
                );
            }

            info!("Removed cluster [{}]", cluster.name);
        }
        Ok(())
    }

    /// Stop clusters, workers first
    pub async fn stop(&self, all: bool, name: &str) -> Result<()> {
        for cluster in self.select(all, name).await? {
            info!("Stopping cluster [{}]", cluster.name);

            if !cluster.workers.is_empty() {
                info!("...Stopping {} workers", cluster.workers.len());
            }
            for worker in &cluster.workers {
                if let Err(e) = self.docker.stop(&worker.id).await {
                    warn!("{}", e);
                }
            }

            info!("...Stopping server");
            self.docker.stop(&cluster.server.id).await.map_err(|e| {
                K3dError::Docker(format!(
                    "Couldn't stop server for cluster {}: {}",
                    cluster.name, e
                ))
            })?;

            info!("Stopped cluster [{}]", cluster.name);
        }
        Ok(())
    }

    /// Start clusters, server first
    pub async fn start(&self, all: bool, name: &str) -> Result<()> {
        for cluster in self.select(all, name).await? {
            info!("Starting cluster [{}]", cluster.name);

            info!("...Starting server");
            self.docker.start(&cluster.server.id).await.map_err(|e| {
                K3dError::Docker(format!(
                    "Couldn't start server for cluster {}: {}",
                    cluster.name, e
                ))
            })?;

            if !cluster.workers.is_empty() {
                info!("...Starting {} workers", cluster.workers.len());
            }
            for worker in &cluster.workers {
                if let Err(e) = self.docker.start(&worker.id).await {
                    warn!("{}", e);
                }
            }

            info!("Started cluster [{}]", cluster.name);
        }
        Ok(())
    }

    /// Copy the kubeconfig out of the server into the cluster directory
    async fn fetch_kubeconfig(&self, cluster: &Cluster) -> Result<PathBuf> {
        let archive = self
            .docker
            .copy_from(&cluster.server.id, KUBECONFIG_CONTAINER_PATH)
            .await?;
        let mut kubeconfig = extract_kubeconfig(&archive)?;

        if let Some(ip) = self.machine_ip().await {
            kubeconfig = rewrite_server_host(&kubeconfig, &ip)?;
        }

        let path = self.dirs.kubeconfig_path(&cluster.name);
        std::fs::create_dir_all(self.dirs.cluster_dir(&cluster.name))?;
        std::fs::write(&path, kubeconfig)?;
        debug!("Wrote kubeconfig to {}", path.display());
        Ok(path)
    }

    /// Fetch fresh kubeconfigs, returning their paths
    pub async fn get_kubeconfig(&self, all: bool, name: &str) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for cluster in self.select(all, name).await? {
            paths.push(self.fetch_kubeconfig(&cluster).await?);
        }
        Ok(paths)
    }

    /// Kubeconfig path of a cluster, fetched only if not present yet
    pub async fn kubeconfig_path(&self, name: &str) -> Result<PathBuf> {
        let clusters = self.select(false, name).await?;
        let cluster = clusters
            .first()
            .ok_or_else(|| K3dError::ClusterNotFound(name.to_string()))?;

        let path = self.dirs.kubeconfig_path(name);
        if path.exists() {
            return Ok(path);
        }
        self.fetch_kubeconfig(cluster).await
    }

    /// Import images from the local engine into every node of a cluster
    pub async fn import_images(&self, name: &str, images: &[String]) -> Result<()> {
        let clusters = self.select(false, name).await?;
        let cluster = clusters
            .first()
            .ok_or_else(|| K3dError::ClusterNotFound(name.to_string()))?;
        crate::image::import_images(&self.docker, &self.dirs, cluster, images).await
    }
}
