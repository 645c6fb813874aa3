use super::schema::{CsspathConfig, check_prefix};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Config files in lookup order: `./csspath.yaml`, then
    /// `~/.csspath/config.yaml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("csspath.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".csspath").join("config.yaml"));
        }
        paths
    }

    /// First existing file of [`search_paths`](Self::search_paths), or defaults.
    pub async fn load_default() -> Result<CsspathConfig, ConfigError> {
        for path in Self::search_paths() {
            if tokio::fs::try_exists(&path).await? {
                return Self::load_from(&path).await;
            }
            debug!("No config at {}", path.display());
        }
        Ok(CsspathConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<CsspathConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates YAML. A blank document yields the defaults.
    pub fn parse(content: &str) -> Result<CsspathConfig, ConfigError> {
        if content.trim().is_empty() {
            return Ok(CsspathConfig::default());
        }
        let config: CsspathConfig = serde_yaml::from_str(content)?;
        check_prefix(&config.compiler.prefix).map_err(|reason| ConfigError::Invalid {
            field: "compiler.prefix",
            reason,
        })?;
        Ok(config)
    }
}
