//! Configuration types for tube-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Download behavior configuration (output directory, concurrency)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory handed to the fetcher (default: "~/Downloads/YouTube")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent downloads (default: 3)
    ///
    /// Fixed once the manager is constructed.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the yt-dlp binary (None = search PATH when `search_path` is set)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg, forwarded to yt-dlp as `--ffmpeg-location`
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp when no explicit path is set
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Logging configuration consumed by [`crate::logging::init_logging`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file; console output is always enabled
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

/// Main configuration for [`crate::DownloadManager`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Environment variables understood by [`Config::from_env`]
pub mod env_keys {
    /// Output directory
    pub const DOWNLOADS_DIR: &str = "DOWNLOADS_DIR";
    /// Maximum concurrent downloads
    pub const MAX_CONCURRENT_DOWNLOADS: &str = "MAX_CONCURRENT_DOWNLOADS";
    /// Default log level
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// Log file path
    pub const LOG_FILE: &str = "LOG_FILE";
    /// yt-dlp binary path
    pub const YTDLP_PATH: &str = "YTDLP_PATH";
    /// ffmpeg binary path
    pub const FFMPEG_PATH: &str = "FFMPEG_PATH";
}

impl Config {
    /// Build a configuration from the defaults overlaid with process environment variables
    ///
    /// See [`env_keys`] for the recognized variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the variable when a value cannot be parsed
    /// or the resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values returned by `lookup` on top of `self`
    ///
    /// Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(env_keys::DOWNLOADS_DIR) {
            self.download.download_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(env_keys::MAX_CONCURRENT_DOWNLOADS) {
            self.download.max_concurrent_downloads = raw.trim().parse().map_err(|e| {
                Error::config(
                    env_keys::MAX_CONCURRENT_DOWNLOADS,
                    format!("expected a positive integer, got '{}': {}", raw, e),
                )
            })?;
        }
        if let Some(level) = get(env_keys::LOG_LEVEL) {
            self.logging.level = level.trim().to_lowercase();
        }
        if let Some(file) = get(env_keys::LOG_FILE) {
            self.logging.log_file = Some(PathBuf::from(file));
        }
        if let Some(path) = get(env_keys::YTDLP_PATH) {
            self.tools.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get(env_keys::FFMPEG_PATH) {
            self.tools.ffmpeg_path = Some(PathBuf::from(path));
        }

        self.validate()?;
        Ok(self)
    }

    /// Check invariants the manager relies on
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                env_keys::MAX_CONCURRENT_DOWNLOADS,
                "max_concurrent_downloads must be at least 1",
            ));
        }
        Ok(())
    }

    /// Output directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }
}

fn default_download_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Downloads").join("YouTube"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

fn default_max_concurrent() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
