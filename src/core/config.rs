//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.reading-resources/config.toml`. If missing on first
//! run, a commented-out default is generated so users can discover all options.

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Reading;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ResourcesConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub reading: Option<Reading>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub resources_dir: Option<String>,
    pub bundle_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DownloadConfig {
    pub base_url: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://resources.quran.app/readings";
pub const DEFAULT_LOG_FILE: &str = "reading-resources.log";
pub const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

const CONFIG_DIR: &str = ".reading-resources";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub reading: Reading,
    pub resources_dir: PathBuf,
    pub bundle_dir: Option<PathBuf>,
    pub base_url: String,
    pub log_file: PathBuf,
    pub log_level: log::LevelFilter,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR))
}

/// Returns the path to `~/.reading-resources/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.reading-resources/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ResourcesConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ResourcesConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ResourcesConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ResourcesConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. The file must exist.
pub fn load_config_from(path: &Path) -> Result<ResourcesConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ResourcesConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Reading Resources Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# reading = "hafs_1405"              # "hafs_1405", "hafs_1421", "hafs_1440", "tajweed"
# log_file = "reading-resources.log"
# log_level = "info"                 # "off", "error", "warn", "info", "debug", "trace"

# [storage]
# resources_dir = "/path/to/resources"   # Default: ~/.reading-resources/resources
# bundle_dir = "/path/to/bundled"        # Read-only packages shipped with the app

# [download]
# base_url = "https://resources.quran.app/readings"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_reading` is from the CLI flag (None = not specified).
pub fn resolve(config: &ResourcesConfig, cli_reading: Option<Reading>) -> ResolvedConfig {
    // Reading: CLI → env → config → default
    let reading = cli_reading
        .or_else(|| env_reading("READING_RESOURCES_READING"))
        .or(config.general.reading)
        .unwrap_or_default();

    // Resources directory: env → config → ~/.reading-resources/resources
    let resources_dir = std::env::var("READING_RESOURCES_DIR")
        .ok()
        .or_else(|| config.storage.resources_dir.clone())
        .map(PathBuf::from)
        .or_else(|| config_dir().map(|d| d.join("resources")))
        .unwrap_or_else(|| PathBuf::from("resources"));

    // Bundle directory: env → config (no default; bundles are optional)
    let bundle_dir = std::env::var("READING_RESOURCES_BUNDLE_DIR")
        .ok()
        .or_else(|| config.storage.bundle_dir.clone())
        .map(PathBuf::from);

    // Base URL: env → config → default
    let base_url = std::env::var("READING_RESOURCES_BASE_URL")
        .ok()
        .or_else(|| config.download.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let log_level = match config.general.log_level.as_deref() {
        Some(level) => level.parse().unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using {}", level, DEFAULT_LOG_LEVEL);
            DEFAULT_LOG_LEVEL
        }),
        None => DEFAULT_LOG_LEVEL,
    };

    ResolvedConfig {
        reading,
        resources_dir,
        bundle_dir,
        base_url,
        log_file: PathBuf::from(
            config
                .general
                .log_file
                .as_deref()
                .unwrap_or(DEFAULT_LOG_FILE),
        ),
        log_level,
    }
}

fn env_reading(var: &str) -> Option<Reading> {
    let value = std::env::var(var).ok()?;
    match Reading::from_str(&value, true) {
        Ok(reading) => Some(reading),
        Err(_) => {
            warn!("Ignoring {}: unknown reading '{}'", var, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = ResourcesConfig::default();
        assert!(config.general.reading.is_none());
        assert!(config.storage.bundle_dir.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = ResourcesConfig::default();
        let resolved = resolve(&config, None);
        assert_eq!(resolved.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(resolved.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ResourcesConfig {
            general: GeneralConfig {
                reading: Some(Reading::Tajweed),
                log_file: Some("custom.log".to_string()),
                log_level: Some("debug".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve(&config, None);
        assert_eq!(resolved.log_file, PathBuf::from("custom.log"));
        assert_eq!(resolved.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn test_resolve_cli_reading_wins() {
        let config = ResourcesConfig {
            general: GeneralConfig {
                reading: Some(Reading::Hafs1421),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve(&config, Some(Reading::Hafs1440));
        assert_eq!(resolved.reading, Reading::Hafs1440);
    }

    #[test]
    fn test_unknown_log_level_falls_back() {
        let config = ResourcesConfig {
            general: GeneralConfig {
                log_level: Some("chatty".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(resolve(&config, None).log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[general]
reading = "hafs_1440"
log_level = "warn"

[storage]
resources_dir = "/var/lib/readings"
bundle_dir = "/usr/share/readings"

[download]
base_url = "http://localhost:8080"
"#;
        let config: ResourcesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.reading, Some(Reading::Hafs1440));
        assert_eq!(config.general.log_level.as_deref(), Some("warn"));
        assert_eq!(
            config.storage.bundle_dir.as_deref(),
            Some("/usr/share/readings")
        );
        assert_eq!(
            config.download.base_url.as_deref(),
            Some("http://localhost:8080")
        );
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[download]
base_url = "http://mirror.example"
"#;
        let config: ResourcesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.download.base_url.as_deref(),
            Some("http://mirror.example")
        );
        assert!(config.general.reading.is_none());
        assert!(config.storage.resources_dir.is_none());
    }

    #[test]
    fn test_unknown_reading_is_a_parse_error() {
        let toml_str = r#"
[general]
reading = "warsh"
"#;
        assert!(toml::from_str::<ResourcesConfig>(toml_str).is_err());
    }

    #[test]
    fn test_load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/reading-resources.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
