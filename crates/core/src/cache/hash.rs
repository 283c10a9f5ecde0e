//! Cache key generation.

use sha2::{Digest, Sha256};

/// Hex SHA-256 over newline-separated key parts.
pub fn compute_cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let a = compute_cache_key(&["budget", "NAM", "0", "10"]);
        let b = compute_cache_key(&["budget", "NAM", "0", "10"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_separates_parts() {
        assert_ne!(compute_cache_key(&["ab", "c"]), compute_cache_key(&["a", "bc"]));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key(&["budget"]);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
