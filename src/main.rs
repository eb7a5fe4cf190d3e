//! k3d - run k3s clusters in Docker
//!
//! This is the main CLI entry point for k3d.

use clap::{Args, Parser, Subcommand};
use k3d::cluster::{ApiPort, ClusterConfig, ClusterDirs, ClusterManager, DEFAULT_CLUSTER_NAME};
use k3d::docker::DockerCli;
use k3d::error::Result;
use k3d::shell::subshell;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// k3d - run k3s clusters in Docker
#[derive(Parser)]
#[command(name = "k3d")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Run k3s clusters in Docker containers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Cluster selection shared by several commands
#[derive(Args)]
struct Target {
    /// Name of the cluster
    #[arg(short, long, default_value = DEFAULT_CLUSTER_NAME)]
    name: String,
    /// Apply to all clusters (this ignores --name)
    #[arg(short, long)]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check if docker is running
    #[command(name = "check-tools", alias = "ct")]
    CheckTools,

    /// Start a subshell for a cluster
    Shell {
        /// Name of the cluster
        #[arg(short, long, default_value = DEFAULT_CLUSTER_NAME)]
        name: String,
        /// Run a shell command in the context of the cluster
        #[arg(short, long)]
        command: Option<String>,
        /// Which shell to use, one of [auto, bash, zsh]
        #[arg(short, long, default_value = "auto")]
        shell: String,
    },

    /// Create a single- or multi-node k3s cluster in docker containers
    #[command(alias = "c")]
    Create {
        /// Name of the cluster
        #[arg(short, long, default_value = DEFAULT_CLUSTER_NAME)]
        name: String,
        /// Mount a volume into every node (source:destination)
        #[arg(short, long)]
        volume: Vec<String>,
        /// Publish node ports to the host ([ip:][host-port:]container-port[/protocol][@node-specifier])
        #[arg(long, visible_alias = "add-port")]
        publish: Vec<String>,
        /// Add an offset (plus worker index) to published host ports of workers
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        port_auto_offset: i32,
        /// Kubernetes API server endpoint ([host:]port)
        #[arg(short, long, default_value = "6443")]
        api_port: String,
        /// Wait for the server to come up, timeout in seconds (0 waits forever)
        #[arg(short, long)]
        wait: Option<u64>,
        /// k3s image (<repo>/<image>:<tag>)
        #[arg(short, long, default_value_t = k3d::cluster::config::default_image())]
        image: String,
        /// Additional argument for the k3s server (repeatable)
        #[arg(short = 'x', long)]
        server_arg: Vec<String>,
        /// Additional environment variable for the server (repeatable)
        #[arg(short, long)]
        env: Vec<String>,
        /// Number of worker nodes
        #[arg(long, default_value_t = 0)]
        workers: usize,
        /// Restart node containers unless they were stopped
        #[arg(long)]
        auto_restart: bool,
    },

    /// Delete cluster
    #[command(aliases = ["d", "del"])]
    Delete {
        #[command(flatten)]
        target: Target,
    },

    /// Stop cluster
    Stop {
        #[command(flatten)]
        target: Target,
    },

    /// Start a stopped cluster
    Start {
        #[command(flatten)]
        target: Target,
    },

    /// List all clusters
    #[command(aliases = ["ls", "l"])]
    List,

    /// Get kubeconfig location for cluster
    #[command(name = "get-kubeconfig")]
    GetKubeconfig {
        #[command(flatten)]
        target: Target,
    },

    /// Import images from the local docker daemon into a cluster
    #[command(name = "import-images", alias = "i")]
    ImportImages {
        /// Name of the cluster
        #[arg(short, long, default_value = DEFAULT_CLUSTER_NAME)]
        name: String,
        /// Images to import
        #[arg(required = true)]
        images: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let manager = ClusterManager::new(DockerCli::new(), ClusterDirs::from_home()?);

    match cli.command {
        Commands::CheckTools => {
            manager.check_tools().await?;
        }

        Commands::Shell {
            name,
            command,
            shell,
        } => {
            subshell(&manager, &name, &shell, command.as_deref()).await?;
        }

        Commands::Create {
            name,
            volume,
            publish,
            port_auto_offset,
            api_port,
            wait,
            image,
            server_arg,
            env,
            workers,
            auto_restart,
        } => {
            let config = ClusterConfig {
                name: name.clone(),
                image,
                api_port: ApiPort::parse(&api_port)?,
                server_args: server_arg,
                env,
                volumes: volume,
                publish,
                port_auto_offset,
                workers,
                wait,
                auto_restart,
            };

            manager.create(&config).await?;

            let bin = std::env::args().next().unwrap_or_else(|| "k3d".to_string());
            info!(
                "You can now use the cluster with:\n\nexport KUBECONFIG=\"$({} get-kubeconfig --name='{}')\"\nkubectl cluster-info",
                bin, name
            );
        }

        Commands::Delete { target } => {
            manager.delete(target.all, &target.name).await?;
        }

        Commands::Stop { target } => {
            manager.stop(target.all, &target.name).await?;
        }

        Commands::Start { target } => {
            manager.start(target.all, &target.name).await?;
        }

        Commands::List => {
            let clusters = manager.clusters(true, "").await?;
            if clusters.is_empty() {
                info!("No clusters found!");
                return Ok(());
            }

            println!(
                "{:<20} {:<40} {:<12} {:<8}",
                "NAME", "IMAGE", "STATUS", "WORKERS"
            );
            for cluster in clusters {
                println!(
                    "{:<20} {:<40} {:<12} {:<8}",
                    cluster.name,
                    cluster.image,
                    cluster.status,
                    cluster.worker_summary()
                );
            }
        }

        Commands::GetKubeconfig { target } => {
            for path in manager.get_kubeconfig(target.all, &target.name).await? {
                println!("{}", path.display());
            }
        }

        Commands::ImportImages { name, images } => {
            manager.import_images(&name, &images).await?;
        }
    }

    Ok(())
}
