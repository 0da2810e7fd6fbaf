//! Declares which crates' test binaries this run should build and execute.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TestTarget {
    #[serde(rename = "crate")]
    pub crate_name: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(rename = "target", default)]
    pub targets: Vec<TestTarget>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_with_and_without_features() {
        let raw = r#"
            [[target]]
            crate = "broker-pool"

            [[target]]
            crate = "broker-reset"
            features = ["live-db"]
        "#;
        let manifest: Manifest = toml::from_str(raw).unwrap();
        assert_eq!(manifest.targets.len(), 2);
        assert_eq!(manifest.targets[0].crate_name, "broker-pool");
        assert!(manifest.targets[0].features.is_empty());
        assert_eq!(manifest.targets[1].features, vec!["live-db".to_string()]);
    }

    #[test]
    fn empty_manifest_has_no_targets() {
        let manifest: Manifest = toml::from_str("").unwrap();
        assert!(manifest.targets.is_empty());
    }
}
