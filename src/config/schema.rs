//! Configuration schema for Ailloy
//!
//! Configuration is stored at `~/.config/ailloy/config.toml`

use crate::cache::CacheLayout;
use crate::error::AilloyResult;
use crate::mold::LOCKFILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mold cache settings
    pub cache: CacheConfig,

    /// Lock file settings
    pub lock: LockConfig,

    /// Git settings
    pub git: GitConfig,
}

/// Mold cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (default: ~/.ailloy/cache)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl CacheConfig {
    /// Configured root, or the home-derived default
    pub fn root(&self) -> AilloyResult<PathBuf> {
        match self.root {
            Some(ref root) => Ok(root.clone()),
            None => CacheLayout::default_root(),
        }
    }
}

/// Lock file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lock file path, relative paths resolved against the project directory
    pub file: PathBuf,

    /// Record resolutions in the lock file
    pub enabled: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(LOCKFILE_NAME),
            enabled: true,
        }
    }
}

/// Git configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Git executable
    pub binary: PathBuf,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.cache.root.is_none());
        assert_eq!(config.lock.file, PathBuf::from("ailloy.lock"));
        assert!(config.lock.enabled);
        assert_eq!(config.git.binary, PathBuf::from("git"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = toml::from_str("[cache]\nroot = \"/tmp/molds\"\n").unwrap();
        assert_eq!(config.cache.root().unwrap(), PathBuf::from("/tmp/molds"));
        assert_eq!(config.lock.file, PathBuf::from("ailloy.lock"));
    }

    #[test]
    fn serialize_roundtrip() {
        let mut config = Config::default();
        config.lock.enabled = false;
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[lock]"));
        assert!(!text.contains("root"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert!(!parsed.lock.enabled);
    }
}
