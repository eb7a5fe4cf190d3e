//! Image import into cluster nodes

use crate::cluster::kubeconfig::ClusterDirs;
use crate::cluster::lifecycle::IMAGES_MOUNT;
use crate::cluster::Cluster;
use crate::docker::{ContainerSummary, DockerCli};
use crate::error::{K3dError, Result};
use std::path::Path;
use tracing::{info, warn};

/// File name of an image tarball: `:` and `/` become `_`
pub fn tarball_name(image: &str) -> String {
    format!("{}.tar", image.replace([':', '/'], "_"))
}

/// `ctr image import` prints `...done` for every imported image
pub fn import_succeeded(output: &str) -> bool {
    output.contains("done")
}

/// Save each image from the local engine and import it in every node
///
/// Tarballs go to the cluster image directory, which nodes see at
/// `/images`. A tarball is removed once its import finished.
pub async fn import_images(
    docker: &DockerCli,
    dirs: &ClusterDirs,
    cluster: &Cluster,
    images: &[String],
) -> Result<()> {
    if images.is_empty() {
        return Err(K3dError::ImageImport("no images specified".to_string()));
    }

    let dir = dirs.images_dir(&cluster.name);
    std::fs::create_dir_all(&dir)?;

    let nodes: Vec<&ContainerSummary> = std::iter::once(&cluster.server)
        .chain(cluster.workers.iter())
        .collect();

    for image in images {
        let tarball = dir.join(tarball_name(image));

        let result = import_one(docker, &nodes, image, &tarball).await;

        if tarball.exists() {
            info!("Cleaning up tarball...");
            if let Err(e) = std::fs::remove_file(&tarball) {
                warn!("Couldn't remove tarball [{}]: {}", tarball.display(), e);
            }
        }
        result?;

        info!(
            "Successfully imported image [{}] in all nodes of cluster [{}]",
            image, cluster.name
        );
    }

    Ok(())
}

async fn import_one(
    docker: &DockerCli,
    nodes: &[&ContainerSummary],
    image: &str,
    tarball: &Path,
) -> Result<()> {
    info!("Saving image [{}] from local docker daemon...", image);
    docker
        .save_image(image, tarball)
        .await
        .map_err(|e| K3dError::ImageImport(format!("failed to save image [{}] locally: {}", image, e)))?;

    let remote = format!("{}/{}", IMAGES_MOUNT, tarball_name(image));
    for node in nodes {
        info!("Importing image [{}] in container [{}]", image, node.name());
        let output = docker
            .exec(&node.id, &["ctr", "image", "import", &remote])
            .await?;

        if !import_succeeded(&output) {
            return Err(K3dError::ImageImport(format!(
                "seems like something went wrong using `ctr image import` in container [{}], full output below:\n{}",
                node.name(),
                output
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tarball_name() {
        assert_eq!(
            tarball_name("docker.io/library/nginx:1.25"),
            "docker.io_library_nginx_1.25.tar"
        );
        assert_eq!(tarball_name("busybox"), "busybox.tar");
    }

    #[test]
    fn test_import_succeeded() {
        assert!(import_succeeded("unpacking docker.io/library/nginx:1.25 (sha256:abc)...done\n"));
        assert!(!import_succeeded("ctr: image might be filtered out\n"));
    }
}
