//! Deterministic stand-ins for sandbox telemetry
//!
//! No package is ever executed. These counters are derived from a SHA-256
//! identity hash of the package with a pure hash-to-range mapping, so the
//! same facts always produce the same numbers. They are carried for display
//! only and are never part of the feature schema.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::RawFacts;

/// Synthesized runtime counters. `synthesized` is always `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticTelemetry {
    pub synthesized: bool,
    /// Hex identity hash the counters were derived from
    pub identity: String,
    pub unique_domains: u32,
    pub dns_queries: u32,
    pub tcp_connections: u32,
    pub total_api_calls: u32,
    pub reflection_calls: u32,
    pub crypto_calls: u32,
    pub sms_operations: u32,
    pub total_syscalls: u32,
}

/// SHA-256 over package name, version code and file size.
pub fn identity_hash(raw: &RawFacts) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(raw.package_name.as_deref().unwrap_or("").trim().as_bytes());
    hasher.update(b"|");
    hasher.update(raw.version_code.unwrap_or(1).to_le_bytes());
    hasher.update(b"|");
    let size = raw.file_size.filter(|s| s.is_finite() && *s >= 0.0).unwrap_or(0.0);
    hasher.update((size as u64).to_le_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Map the `slot`-th 4-byte window of `digest` into `lo..=hi`.
fn hash_to_range(digest: &[u8; 32], slot: usize, lo: u32, hi: u32) -> u32 {
    let offset = (slot * 4) % digest.len();
    let word = u32::from_le_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    let span = hi.saturating_sub(lo) as u64 + 1;
    lo + (word as u64 % span) as u32
}

impl SyntheticTelemetry {
    pub fn from_facts(raw: &RawFacts) -> Self {
        let digest = identity_hash(raw);
        let identity = digest.iter().map(|b| format!("{b:02x}")).collect();
        Self {
            synthesized: true,
            identity,
            unique_domains: hash_to_range(&digest, 0, 1, 25),
            dns_queries: hash_to_range(&digest, 1, 5, 200),
            tcp_connections: hash_to_range(&digest, 2, 1, 60),
            total_api_calls: hash_to_range(&digest, 3, 100, 5000),
            reflection_calls: hash_to_range(&digest, 4, 0, 150),
            crypto_calls: hash_to_range(&digest, 5, 0, 80),
            sms_operations: hash_to_range(&digest, 6, 0, 20),
            total_syscalls: hash_to_range(&digest, 7, 500, 20_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(name: &str, code: i64) -> RawFacts {
        RawFacts {
            package_name: Some(name.to_string()),
            version_code: Some(code),
            file_size: Some(1_048_576.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_deterministic() {
        let a = SyntheticTelemetry::from_facts(&facts("com.example.app", 3));
        let b = SyntheticTelemetry::from_facts(&facts("com.example.app", 3));
        assert_eq!(a, b);
        assert!(a.synthesized);
        assert_eq!(a.identity.len(), 64);
    }

    #[test]
    fn test_identity_depends_on_version() {
        let a = SyntheticTelemetry::from_facts(&facts("com.example.app", 3));
        let b = SyntheticTelemetry::from_facts(&facts("com.example.app", 4));
        assert_ne!(a.identity, b.identity);
    }

    #[test]
    fn test_ranges_hold() {
        for i in 0..50 {
            let t = SyntheticTelemetry::from_facts(&facts(&format!("pkg.{i}"), i));
            assert!((1..=25).contains(&t.unique_domains));
            assert!((5..=200).contains(&t.dns_queries));
            assert!((1..=60).contains(&t.tcp_connections));
            assert!((100..=5000).contains(&t.total_api_calls));
            assert!(t.reflection_calls <= 150);
            assert!(t.crypto_calls <= 80);
            assert!(t.sms_operations <= 20);
            assert!((500..=20_000).contains(&t.total_syscalls));
        }
    }

    #[test]
    fn test_empty_facts_do_not_panic() {
        let t = SyntheticTelemetry::from_facts(&RawFacts::default());
        assert!(t.synthesized);
    }
}
