//! Engine configuration
//!
//! Loads engine-level configuration from a `riskgraph.toml` file in the
//! deployment directory, falling back to built-in defaults when the file is
//! absent or malformed.
//!
//! # Configuration Format
//!
//! ```toml
//! # riskgraph.toml
//!
//! [correlation]
//! relevance_threshold = 0.3
//!
//! [batch]
//! workers = 8
//!
//! [sectors]
//! energy = 1.8
//! finance = 2.0
//! healthcare = 1.7
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Engine-level configuration loaded from riskgraph.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    /// Correlation tuning
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Batch execution tuning
    #[serde(default)]
    pub batch: BatchConfig,

    /// Economic factor per organization sector; sectors not listed use 1.0
    #[serde(default = "default_sector_factors")]
    pub sectors: HashMap<String, f64>,
}

/// Correlation tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Minimum relevance (exclusive) for a pair to be retained
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

fn default_relevance_threshold() -> f64 {
    0.3
}

/// Batch execution tuning knobs
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BatchConfig {
    /// Worker threads for batch evaluation (0 = auto-detect)
    #[serde(default)]
    pub workers: usize,
}

fn default_sector_factors() -> HashMap<String, f64> {
    let mut sectors = HashMap::new();
    sectors.insert("energy".to_string(), 1.8);
    sectors.insert("finance".to_string(), 2.0);
    sectors.insert("healthcare".to_string(), 1.7);
    sectors.insert("telecom".to_string(), 1.5);
    sectors.insert("government".to_string(), 1.4);
    sectors.insert("transport".to_string(), 1.3);
    sectors
}

impl EngineConfig {
    /// Built-in defaults with the standard sector table
    pub fn builtin() -> Self {
        Self {
            correlation: CorrelationConfig::default(),
            batch: BatchConfig::default(),
            sectors: default_sector_factors(),
        }
    }

    /// Load configuration from `riskgraph.toml` under the given directory.
    ///
    /// Missing or unparseable files fall back to the built-in defaults with
    /// a warning; scoring never fails because of configuration.
    pub fn load(dir: &Path) -> Self {
        let toml_path = dir.join("riskgraph.toml");
        if toml_path.exists() {
            match std::fs::read_to_string(&toml_path)
                .map_err(|e| e.to_string())
                .and_then(|content| toml::from_str::<EngineConfig>(&content).map_err(|e| e.to_string()))
            {
                Ok(config) => {
                    debug!("Loaded engine config from {}", toml_path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load {}: {}", toml_path.display(), e);
                }
            }
        }
        Self::builtin()
    }

    /// Economic factor for a sector; unlisted or absent sectors are neutral
    pub fn sector_factor(&self, sector: Option<&str>) -> f64 {
        sector
            .and_then(|s| self.sectors.get(&s.to_lowercase()).copied())
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::builtin();
        assert!((config.correlation.relevance_threshold - 0.3).abs() < 1e-9);
        assert_eq!(config.batch.workers, 0);
        assert!((config.sector_factor(Some("finance")) - 2.0).abs() < 1e-9);
        assert!((config.sector_factor(Some("retail")) - 1.0).abs() < 1e-9);
        assert!((config.sector_factor(None) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sector_lookup_case_insensitive() {
        let config = EngineConfig::builtin();
        assert!((config.sector_factor(Some("Energy")) - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("riskgraph.toml"),
            r#"
[correlation]
relevance_threshold = 0.5

[batch]
workers = 4

[sectors]
maritime = 1.6
"#,
        )
        .unwrap();

        let config = EngineConfig::load(dir.path());
        assert!((config.correlation.relevance_threshold - 0.5).abs() < 1e-9);
        assert_eq!(config.batch.workers, 4);
        assert!((config.sector_factor(Some("maritime")) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path());
        assert!((config.correlation.relevance_threshold - 0.3).abs() < 1e-9);
        assert!(!config.sectors.is_empty());
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("riskgraph.toml"), "not [valid toml").unwrap();
        let config = EngineConfig::load(dir.path());
        assert!((config.correlation.relevance_threshold - 0.3).abs() < 1e-9);
    }
}
