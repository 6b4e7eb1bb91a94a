//! Configuration management.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration. Environment variables always win over these
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Issue ECDSA leaf keys by default.
    #[serde(default)]
    pub ecdsa: bool,

    /// Default trust-store enablement when $TRUST_STORES is unset.
    pub trust_stores: Option<Vec<String>>,
}

impl Config {
    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "certmint", "certmint")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from file, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.ecdsa);
        assert!(config.trust_stores.is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let content = "ecdsa = true\ntrust_stores = [\"system\", \"nss\"]\n";
        let config: Config = toml::from_str(content).unwrap();
        assert!(config.ecdsa);
        assert_eq!(
            config.trust_stores,
            Some(vec!["system".to_string(), "nss".to_string()])
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.ecdsa);
        assert!(config.trust_stores.is_none());
    }
}
