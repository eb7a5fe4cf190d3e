//! Bootstrap secrets shared by the nodes of a cluster

/// Length of generated secrets
pub const SECRET_LENGTH: usize = 20;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random string of `n` ASCII letters
pub fn generate_secret(n: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    (0..n)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// `K3S_CLUSTER_SECRET` and `K3S_TOKEN` environment entries
pub fn cluster_secret_env() -> Vec<String> {
    vec![
        format!("K3S_CLUSTER_SECRET={}", generate_secret(SECRET_LENGTH)),
        format!("K3S_TOKEN={}", generate_secret(SECRET_LENGTH)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(20);
        assert_eq!(secret.len(), 20);
        assert!(secret.chars().all(|c| c.is_ascii_alphabetic()));
        assert!(generate_secret(0).is_empty());
    }

    #[test]
    fn test_secrets_differ() {
        assert_ne!(generate_secret(32), generate_secret(32));
    }

    #[test]
    fn test_cluster_secret_env() {
        let env = cluster_secret_env();
        assert_eq!(env.len(), 2);
        assert!(env[0].starts_with("K3S_CLUSTER_SECRET="));
        assert!(env[1].starts_with("K3S_TOKEN="));
        assert_eq!(env[1].len(), "K3S_TOKEN=".len() + SECRET_LENGTH);
    }
}
