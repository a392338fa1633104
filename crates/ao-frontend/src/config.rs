//! Application configuration
//!
//! Persisted as RON. Missing fields fall back to their defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ao_renderer::RenderConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Preview settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub render: RenderConfig,
    /// Re-render shapes whose mesh landed stale
    pub rerender_stale: bool,
    /// How long one preview tick waits for a completion
    pub poll_interval_ms: u64,
    /// Upper bound for waiting on renders to settle
    pub timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            rerender_stale: true,
            poll_interval_ms: 16,
            timeout_ms: 30_000,
        }
    }
}

/// Shared, hot-swappable configuration
pub type SharedConfig = Arc<RwLock<AppConfig>>;

/// Loads and saves the configuration file
pub struct ConfigManager {
    path: Option<PathBuf>,
    config: SharedConfig,
}

impl ConfigManager {
    /// Load from `path`, or use defaults when no path is given or the file
    /// does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) if p.exists() => Self::load(p)?,
            Some(p) => {
                tracing::info!("Config {} not found, using defaults", p.display());
                AppConfig::default()
            }
            None => AppConfig::default(),
        };
        Ok(Self {
            path: path.map(Path::to_path_buf),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Read a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::parse(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        let config: AppConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config
            .render
            .region
            .voxel_count()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }

    /// Serialize the current configuration
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(&*self.config.read(), ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write the current configuration back to its file
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.path.as_ref().ok_or(ConfigError::NoPath)?;
        let content = self.to_ron()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Handle shared with the preview
    pub fn shared(&self) -> SharedConfig {
        self.config.clone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("No config path set")]
    NoPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ConfigManager::parse("(rerender_stale: false)").unwrap();
        assert!(!config.rerender_stale);
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.poll_interval_ms, 16);
    }

    #[test]
    fn test_region_from_ron() {
        let config = ConfigManager::parse(
            "(render: (region: (min: (-2.0, -2.0, -2.0), max: (2.0, 2.0, 2.0), resolution: 5)))",
        )
        .unwrap();
        assert_eq!(config.render.region.resolution, 5);
        assert_eq!(config.render.region.voxel_counts(), [20, 20, 20]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ao.ron");

        let manager = ConfigManager::load_or_default(Some(&path)).unwrap();
        assert_eq!(*manager.shared().read(), AppConfig::default());

        manager.shared().write().timeout_ms = 1234;
        manager.save().unwrap();

        let reloaded = ConfigManager::load(&path).unwrap();
        assert_eq!(reloaded.timeout_ms, 1234);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ConfigManager::parse("(timeout_ms: \"soon\")"),
            Err(ConfigError::Deserialize(_))
        ));
    }

    #[test]
    fn test_oversized_region_rejected() {
        let text = "(render: (region: (min: (-1.0, -1.0, -1.0), max: (1.0, 1.0, 1.0), \
                    resolution: 4000000000)))";
        assert!(matches!(
            ConfigManager::parse(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_save_without_path() {
        let manager = ConfigManager::load_or_default(None).unwrap();
        assert!(matches!(manager.save(), Err(ConfigError::NoPath)));
    }
}
