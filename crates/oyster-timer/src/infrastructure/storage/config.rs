//! TOML-based configuration for the Oyster Timer binary.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\OysterTimer\config.toml`
//! - Linux:    `~/.config/oyster-timer/config.toml`
//! - macOS:    `~/Library/Application Support/OysterTimer/config.toml`
//!
//! ```toml
//! [app]
//! log_level = "info"
//!
//! [storage]
//! data_dir = "/srv/oyster"
//!
//! [timer]
//! tick_interval_ms = 1000
//! status_ttl_ms = 2500
//!
//! [photo]
//! max_width = 1800
//! jpeg_quality = 78
//! ```
//!
//! Every field carries a `#[serde(default = "...")]`, so a missing file, a
//! missing section, or a missing key all fall back to the compiled-in value.
//!
//! This file configures the program only.  The user's timer settings live in
//! the data directory (see [`super::key_value`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config or data directory could not be determined.
    #[error("could not determine platform {0} directory")]
    NoPlatformDir(&'static str),

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level program configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub photo: PhotoConfig,
}

/// General program behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where the settings document is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Live display timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// How long a status message stays on screen.
    #[serde(default = "default_status_ttl_ms")]
    pub status_ttl_ms: u64,
}

/// Background photo re-encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoConfig {
    /// Images wider than this are downsampled.
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// JPEG quality, 1–100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl TimerConfig {
    /// Tick period; never shorter than 50 ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(50))
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_status_ttl_ms() -> u64 {
    2_500
}
fn default_max_width() -> u32 {
    1_800
}
fn default_jpeg_quality() -> u8 {
    78
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            status_ttl_ms: default_status_ttl_ms(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDir`] when the base directory cannot be
/// determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformDir("config"))
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location, returning
/// `AppConfig::default()` if the file does not yet exist or no config
/// directory is known.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    match config_file_path() {
        Ok(path) => read_config(&path, true),
        Err(_) => Ok(AppConfig::default()),
    }
}

/// Loads `AppConfig` from an explicitly named file, which must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when
/// it is missing) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    read_config(path, false)
}

fn read_config(path: &Path, missing_is_default: bool) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if missing_is_default && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Picks the settings data directory.
///
/// Precedence: `explicit` (the `--data-dir` flag or `OYSTER_DATA_DIR`), then
/// `[storage] data_dir`, then the platform data directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDir`] when nothing is configured and the
/// platform data directory cannot be determined.
pub fn resolve_data_dir(explicit: Option<&Path>, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = &config.storage.data_dir {
        return Ok(dir.clone());
    }
    platform_data_dir().ok_or(ConfigError::NoPlatformDir("data"))
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("OysterTimer"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("oyster-timer"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("OysterTimer")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

/// Resolves the platform data directory for the settings document.
fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("OysterTimer").join("data"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
        Some(base.join("oyster-timer"))
    }

    #[cfg(target_os = "macos")]
    {
        platform_config_dir().map(|dir| dir.join("data"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("oyster_cfg_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_app_config_default_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.app.log_level, "info");
        assert_eq!(cfg.storage.data_dir, None);
        assert_eq!(cfg.timer.tick_interval(), Duration::from_secs(1));
        assert_eq!(cfg.timer.status_ttl(), Duration::from_millis(2_500));
        assert_eq!(cfg.photo.max_width, 1_800);
        assert_eq!(cfg.photo.jpeg_quality, 78);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_named_keys() {
        // Arrange
        let toml_str = r#"
[timer]
status_ttl_ms = 4000
[photo]
jpeg_quality = 90
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.timer.status_ttl_ms, 4_000);
        assert_eq!(cfg.timer.tick_interval_ms, 1_000);
        assert_eq!(cfg.photo.jpeg_quality, 90);
        assert_eq!(cfg.photo.max_width, 1_800);
    }

    #[test]
    fn test_tick_interval_has_a_floor() {
        let timer = TimerConfig {
            tick_interval_ms: 0,
            status_ttl_ms: 0,
        };
        assert_eq!(timer.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.app.log_level = "debug".to_string();
        cfg.storage.data_dir = Some(dir.join("data"));

        // Act
        save_config(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unset_data_dir_is_omitted_from_toml() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(!toml_str.contains("data_dir"));
    }

    #[test]
    fn test_resolve_data_dir_precedence() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.storage.data_dir = Some(PathBuf::from("/from/config"));

        // Act / Assert
        assert_eq!(
            resolve_data_dir(Some(Path::new("/from/flag")), &cfg).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(resolve_data_dir(None, &cfg).unwrap(), PathBuf::from("/from/config"));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_platform_data_dir_is_app_specific() {
        if let Some(dir) = platform_data_dir() {
            assert!(dir.ends_with("oyster-timer"), "got {dir:?}");
        }
    }
}
