//! docker-machine host lookup

use crate::error::{K3dError, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable naming the active docker-machine
pub const DOCKER_MACHINE_NAME_ENV: &str = "DOCKER_MACHINE_NAME";

/// IP of the active docker-machine, `None` when no machine is in use
pub async fn docker_machine_ip() -> Result<Option<String>> {
    let machine = match std::env::var(DOCKER_MACHINE_NAME_ENV) {
        Ok(name) if !name.is_empty() => name,
        _ => return Ok(None),
    };

    let output = Command::new("docker-machine")
        .args(["ip", &machine])
        .output()
        .await
        .map_err(|e| K3dError::Docker(format!("Failed to run docker-machine: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("Error executing 'docker-machine ip': {}", stderr.trim());
        return Err(K3dError::Docker(format!(
            "docker-machine ip {} failed: {}",
            machine,
            stderr.trim()
        )));
    }

    let ip = parse_machine_ip(&String::from_utf8_lossy(&output.stdout));
    debug!("docker-machine {} has IP {:?}", machine, ip);
    Ok(ip)
}

fn parse_machine_ip(stdout: &str) -> Option<String> {
    let ip = stdout.trim();
    (!ip.is_empty()).then(|| ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_machine_ip() {
        assert_eq!(
            parse_machine_ip("192.168.99.100\r\n"),
            Some("192.168.99.100".to_string())
        );
        assert_eq!(parse_machine_ip("\n"), None);
    }
}
