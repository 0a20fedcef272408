//! Configuration handling for repzk CLI
//!
//! Priority: CLI flags > environment variables > config file > defaults

use anyhow::{Context, Result};
use reputation_zk_core::{PolicyConfig, Scalar, VerifierConfig};
use reputation_zk_sdk::{artifacts, envelope::parse_bytes32};
use serde::Deserialize;
use std::{fs, path::PathBuf};

/// Resolved configuration for CLI commands
pub struct Config {
    pub vk_path: Option<PathBuf>,
    pub policy: PolicyConfig,
    pub verifier: VerifierConfig,
    pub quiet: bool,
    pub json_output: bool,
}

impl Config {
    /// Load configuration from file, environment, and CLI args
    pub fn load(common: &super::CommonArgs) -> Result<Self> {
        let file_config = ConfigFile::load()?;

        let vk_path = common
            .vk
            .as_ref()
            .map(|p| expand_tilde(p))
            .or_else(|| file_config.as_ref().and_then(|c| c.default_vk()));

        let policy = match file_config.as_ref().and_then(|c| c.policy.as_ref()) {
            Some(p) => p.resolve()?,
            None => PolicyConfig::default(),
        };

        let mut verifier = VerifierConfig::default();
        if let Some(engine) = file_config.as_ref().and_then(|c| c.engine.as_ref()) {
            if let Some(capacity) = engine.scratch_capacity {
                verifier = verifier.scratch_capacity(capacity);
            }
            if let Some(min) = engine.min_batch_size {
                verifier = verifier.min_batch_size(min);
            }
            if let Some(zero) = engine.zero_on_restore {
                verifier = verifier.zero_on_restore(zero);
            }
        }

        Ok(Self {
            vk_path,
            policy,
            verifier,
            quiet: common.quiet,
            json_output: common.output == super::OutputFormat::Json,
        })
    }

    /// Read and validate the configured verifying key
    pub fn load_vk(&self) -> Result<Vec<u8>> {
        let path = self.vk_path.as_ref().context(
            "No verifying key configured. Use --vk, set REPZK_VK, or configure in ~/.config/repzk/config.toml",
        )?;
        artifacts::load_vk(path).with_context(|| format!("Failed to load verifying key {:?}", path))
    }

    /// Whether decorative output should be printed
    pub fn chatty(&self) -> bool {
        !self.quiet && !self.json_output
    }
}

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    default: Option<DefaultConfig>,
    policy: Option<PolicyFileConfig>,
    engine: Option<EngineConfig>,
}

#[derive(Debug, Deserialize)]
struct DefaultConfig {
    vk: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolicyFileConfig {
    max_proof_age: Option<u32>,
    min_threshold: Option<u16>,
    blacklist_root: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EngineConfig {
    scratch_capacity: Option<usize>,
    min_batch_size: Option<usize>,
    zero_on_restore: Option<bool>,
}

impl ConfigFile {
    /// `Ok(None)` when there is no config file; parse errors are reported
    fn load() -> Result<Option<Self>> {
        let Some(path) = config_file_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        log::debug!("Loaded config from {:?}", path);
        Ok(Some(config))
    }

    fn default_vk(&self) -> Option<PathBuf> {
        self.default
            .as_ref()
            .and_then(|d| d.vk.as_ref())
            .map(|s| expand_tilde(s))
    }
}

impl PolicyFileConfig {
    fn resolve(&self) -> Result<PolicyConfig> {
        let blacklist_root: Option<Scalar> = self
            .blacklist_root
            .as_deref()
            .map(parse_bytes32)
            .transpose()
            .context("Invalid blacklist_root in config file")?;
        Ok(PolicyConfig {
            max_proof_age: self.max_proof_age.unwrap_or(0),
            min_threshold: self.min_threshold.unwrap_or(0),
            blacklist_root,
        })
    }
}

/// Get config file path
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repzk").join("config.toml"))
}

/// Expand ~ to home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
