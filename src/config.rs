// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// Every section falls back to its defaults, so a missing or partial
// config.toml still yields a usable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::policy::DEFAULT_IMAGE_COUNT;

const CONFIG_PATH: &str = "config.toml";

/// Where the loaded configuration came from
#[derive(Debug)]
pub enum ConfigStatus {
    Loaded(PathBuf),
    NotFound(PathBuf),
    /// The file exists but could not be read or parsed; defaults were used
    Invalid(anyhow::Error),
}

impl ConfigStatus {
    /// Report how the configuration was obtained
    pub fn log(&self) {
        match self {
            ConfigStatus::Loaded(path) => log::info!("Loaded configuration from {:?}", path),
            ConfigStatus::NotFound(path) => {
                log::info!("Config file not found at {:?}, using defaults", path)
            }
            ConfigStatus::Invalid(e) => {
                log::warn!("Failed to load {}: {:#}. Using defaults.", CONFIG_PATH, e)
            }
        }
    }
}

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub swapchain: SwapchainSettings,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Playpen".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Swapchain settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SwapchainSettings {
    /// Requested image count before the surface limits are applied
    pub image_count: u32,
}

impl Default for SwapchainSettings {
    fn default() -> Self {
        Self {
            image_count: DEFAULT_IMAGE_COUNT,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Only honored in debug builds
    pub validation_layers: bool,
    pub log_level: String,
    pub list_layers: bool,
    pub queue_self_test: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            log_level: "info".to_string(),
            list_layers: false,
            queue_self_test: true,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults.
    ///
    /// Nothing is logged here; logging is configured from the result, so the
    /// caller reports the returned status once a logger exists.
    pub fn load() -> (Self, ConfigStatus) {
        Self::load_or_default(CONFIG_PATH)
    }

    /// Load configuration from `path`; a missing or unusable file yields defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, ConfigStatus) {
        let path = path.as_ref();

        if !path.exists() {
            return (Config::default(), ConfigStatus::NotFound(path.to_path_buf()));
        }

        match Self::load_from_path(path) {
            Ok(config) => (config, ConfigStatus::Loaded(path.to_path_buf())),
            Err(e) => (Config::default(), ConfigStatus::Invalid(e)),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Configured log level, `Info` when unrecognized
    pub fn log_level(&self) -> log::LevelFilter {
        self.debug.log_level.parse().unwrap_or_else(|_| {
            eprintln!("Unknown log level '{}', defaulting to info", self.debug.log_level);
            log::LevelFilter::Info
        })
    }

    /// Validation needs both the config flag and a debug build
    pub fn validation_enabled(&self) -> bool {
        cfg!(debug_assertions) && self.debug.validation_layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.window.title, "Vulkan Playpen");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.swapchain.image_count, DEFAULT_IMAGE_COUNT);
        assert!(config.debug.queue_self_test);
        assert!(!config.debug.list_layers);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [window]
            width = 1024

            [swapchain]
            image_count = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.swapchain.image_count, 4);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let config: Config = toml::from_str("[debug]\nlog_level = \"DEBUG\"").unwrap();
        assert_eq!(config.log_level(), log::LevelFilter::Debug);

        let config: Config = toml::from_str("[debug]\nlog_level = \"chatty\"").unwrap();
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load_from_path("does/not/exist/config.toml").unwrap();
        assert_eq!(config.window.title, "Vulkan Playpen");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join("vulkan_playpen_malformed_config.toml");
        std::fs::write(&path, "[window\nwidth = ").unwrap();

        let result = Config::load_from_path(&path);
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_falls_back_with_invalid_status() {
        let path = std::env::temp_dir().join("vulkan_playpen_invalid_status_config.toml");
        std::fs::write(&path, "[window\nwidth = ").unwrap();

        let (config, status) = Config::load_or_default(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.window.width, 800);
        match status {
            ConfigStatus::Invalid(e) => assert!(format!("{:#}", e).contains("Failed to parse config file")),
            other => panic!("expected an invalid status, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_reports_not_found() {
        let (config, status) = Config::load_or_default("does/not/exist/config.toml");

        assert_eq!(config.window.title, "Vulkan Playpen");
        assert!(matches!(status, ConfigStatus::NotFound(_)));
    }

    #[test]
    fn valid_file_reports_loaded() {
        let path = std::env::temp_dir().join("vulkan_playpen_loaded_config.toml");
        std::fs::write(&path, "[window]\nheight = 480\n").unwrap();

        let (config, status) = Config::load_or_default(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.window.height, 480);
        assert!(matches!(status, ConfigStatus::Loaded(p) if p == path));
    }
}
