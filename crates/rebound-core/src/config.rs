use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

fn default_num_examples() -> usize {
    5
}

fn default_feedback() -> bool {
    true
}

fn default_model() -> String {
    "claude-3-opus-20240229".into()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1000
}

/// Harness configuration. Loaded once from YAML (or built from CLI flags)
/// and passed explicitly into the runner; nothing reads ambient state later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Path to the NBA SQLite database (opened read-only).
    pub db: PathBuf,
    /// Path to the ground-truth JSON dataset.
    pub dataset: PathBuf,
    #[serde(default = "default_model")]
    pub model: String,
    /// Number of test cases sampled per run.
    #[serde(default = "default_num_examples")]
    pub num_examples: usize,
    /// Whether the one-shot feedback re-prompt is enabled.
    #[serde(default = "default_feedback")]
    pub feedback: bool,
    /// Sampler seed. Same seed selects the same subset.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl HarnessConfig {
    /// Config with only the paths set; every other field takes the same
    /// default a minimal YAML file would get.
    pub fn with_paths(db: PathBuf, dataset: PathBuf) -> Self {
        Self {
            version: default_version(),
            db,
            dataset,
            model: default_model(),
            num_examples: default_num_examples(),
            feedback: default_feedback(),
            seed: 0,
            timeout_seconds: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let cfg: HarnessConfig = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    validate(&cfg)?;
    Ok(cfg)
}

pub fn validate(cfg: &HarnessConfig) -> Result<(), ConfigError> {
    if cfg.num_examples == 0 {
        return Err(ConfigError("num_examples must be at least 1".into()));
    }
    if cfg.timeout_seconds == 0 {
        return Err(ConfigError("timeout_seconds must be at least 1".into()));
    }
    Ok(())
}
