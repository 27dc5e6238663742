use crate::decision::DecisionWeight;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    /// Storage root. When unset the home-based default is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Weight for requests that do not specify one.
    #[serde(default = "default_weight", with = "weight_name")]
    pub default_weight: DecisionWeight,
    #[serde(default = "default_structured_log")]
    pub structured_log: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_weight() -> DecisionWeight {
    DecisionWeight::High
}

fn default_structured_log() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_weight: default_weight(),
            structured_log: default_structured_log(),
            log_level: default_log_level(),
        }
    }
}

impl TriageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// The configuration embedded from `triage.yaml`.
    pub fn default_config() -> Result<Self> {
        const DEFAULT_TRIAGE_YAML: &str = include_str!("../triage.yaml");
        Self::parse(DEFAULT_TRIAGE_YAML).context("Embedded triage.yaml is invalid")
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).context("Failed to parse config as YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            anyhow::bail!(
                "Unknown log level '{}' (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("data_dir must not be empty when set");
            }
        }
        Ok(())
    }
}

/// Weights are written in lower case in YAML.
mod weight_name {
    use crate::decision::DecisionWeight;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(weight: &DecisionWeight, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&weight.label().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DecisionWeight, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
