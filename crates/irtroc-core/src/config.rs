//! irtroc configuration.
//!
//! Settings come from `irtroc.toml`, with environment overrides on top and
//! command-line flags on top of that.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::format::{DataFormat, FormatRegistry};

/// Top-level irtroc configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrtrocConfig {
    /// Data-format profile used when `--data-format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Column holding the held-out flag.
    #[serde(default)]
    pub evaluation_index: Option<usize>,
    /// Seed for the fallback held-out selection.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Custom data-format profiles keyed by name.
    #[serde(default)]
    pub formats: BTreeMap<String, DataFormat>,
}

fn default_format() -> String {
    "simple".to_string()
}

impl Default for IrtrocConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            evaluation_index: None,
            seed: None,
            formats: BTreeMap::new(),
        }
    }
}

impl IrtrocConfig {
    /// Built-in profiles plus the ones declared here.
    pub fn format_registry(&self) -> FormatRegistry {
        FormatRegistry::with_custom(&self.formats)
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `irtroc.toml` in the current directory
/// 2. `~/.config/irtroc/config.toml`
///
/// An explicit `path` must exist. Environment variable overrides:
/// `IRTROC_FORMAT`, `IRTROC_SEED`.
pub fn load_config_from(path: Option<&Path>) -> Result<IrtrocConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("irtroc.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => IrtrocConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config(content: &str) -> Result<IrtrocConfig> {
    Ok(toml::from_str::<IrtrocConfig>(content)?)
}

fn apply_env_overrides(config: &mut IrtrocConfig) -> Result<()> {
    if let Ok(format) = std::env::var("IRTROC_FORMAT") {
        config.default_format = format;
    }
    if let Ok(seed) = std::env::var("IRTROC_SEED") {
        let seed = seed
            .trim()
            .parse::<u64>()
            .with_context(|| format!("IRTROC_SEED must be an unsigned integer, got '{seed}'"))?;
        config.seed = Some(seed);
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("irtroc"))
}
