//! # Filter Records
//!
//! Summary and detailed views of a remote filter as reported by the daemon.
//! Values are taken verbatim from the wire; the client does not validate
//! them beyond parse success.

use serde::{Deserialize, Serialize};

/// Summary of one filter, as returned by `list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloomFilter {
    /// Filter name.
    pub name: String,
    /// Configured key capacity.
    pub capacity: u64,
    /// Target false-positive probability.
    pub probability: f32,
    /// Number of keys currently stored.
    pub size: u64,
    /// Storage footprint in bytes.
    pub storage: u64,
}

/// Detailed filter view, as returned by `info`.
///
/// The summary fields are flattened so the serialized form matches the flat
/// `key value` listing the daemon produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerboseBloomFilter {
    #[serde(flatten)]
    pub filter: BloomFilter,
    pub checks: u64,
    pub check_hits: u64,
    pub check_misses: u64,
    pub page_ins: u64,
    pub page_outs: u64,
    pub sets: u64,
    pub set_hits: u64,
    pub set_misses: u64,
}

impl VerboseBloomFilter {
    /// Filter name.
    pub fn name(&self) -> &str {
        &self.filter.name
    }

    /// Fraction of checks that reported a hit, or `None` before any check.
    pub fn check_hit_ratio(&self) -> Option<f64> {
        if self.checks == 0 {
            return None;
        }
        Some(self.check_hits as f64 / self.checks as f64)
    }
}

impl From<VerboseBloomFilter> for BloomFilter {
    fn from(verbose: VerboseBloomFilter) -> Self {
        verbose.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_serializes_flat() {
        let verbose = VerboseBloomFilter {
            filter: BloomFilter {
                name: "users".to_string(),
                capacity: 1000,
                probability: 0.01,
                size: 3,
                storage: 2048,
            },
            checks: 4,
            check_hits: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&verbose).unwrap();
        assert_eq!(json["name"], "users");
        assert_eq!(json["capacity"], 1000);
        assert_eq!(json["checks"], 4);
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn hit_ratio() {
        let mut verbose = VerboseBloomFilter::default();
        assert_eq!(verbose.check_hit_ratio(), None);
        verbose.checks = 4;
        verbose.check_hits = 1;
        assert_eq!(verbose.check_hit_ratio(), Some(0.25));
    }

    #[test]
    fn into_summary_keeps_fields() {
        let verbose = VerboseBloomFilter {
            filter: BloomFilter {
                name: "a".to_string(),
                size: 9,
                ..Default::default()
            },
            sets: 9,
            ..Default::default()
        };
        let summary: BloomFilter = verbose.into();
        assert_eq!(summary.name, "a");
        assert_eq!(summary.size, 9);
    }
}
