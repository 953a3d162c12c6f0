//! Configuration for the daybreak job.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (credentials, chat id, TIME_ZONE)
//! 2. Config file (.daybreak/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - `DAYBREAK_CONFIG` if set
//! - Searches current directory and parents for .daybreak/config.yaml
//! - Falls back to ~/.daybreak/config.yaml
//! - Paths in config file are relative to the directory holding `.daybreak/`
//!
//! Credentials are only ever read from the environment.

pub mod paths;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::TelegramConfig;

pub const ENV_TELEGRAM_TOKEN: &str = "TG_TOKEN";
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_BING_TOKEN: &str = "BING_TOKEN";
pub const ENV_BING_SRCHHPGUSR: &str = "BING_SRCHHPGUSR";
pub const ENV_DASHSCOPE_API_KEY: &str = "DASHSCOPE_API_KEY";
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_TIME_ZONE: &str = "TIME_ZONE";
pub const ENV_CONFIG_PATH: &str = "DAYBREAK_CONFIG";

const DEFAULT_TIME_ZONE: &str = "Asia/Shanghai";
const DEFAULT_WORK_DIR: &str = "tmp";
const DEFAULT_IMAGE: &str = "tmp/default.jpeg";
const DEFAULT_VOICE_DIR: &str = "outputs";
const DEFAULT_TIMEOUT_SECONDS: u64 = 8;
const DEFAULT_LOCATION: &str = "shanghai";
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 2;
const DEFAULT_MAX_POLLS: u32 = 60;
const DEFAULT_VOICE: &str = "zh-CN-XiaoxiaoNeural";

/// Errors that make the job unable to run at all
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A credential read from the environment. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for building requests only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// How a multi-image provider result is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageDelivery {
    /// Pick one image uniformly at random
    #[default]
    RandomOne,
    /// Send every image as a media group
    Group,
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Working directory for generated images
    pub work_dir: Option<String>,
    /// Image sent when every provider fails
    pub default_image: Option<String>,
    /// Directory for the per-day voice files
    pub voice_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeatherConfig {
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagesConfig {
    pub delivery: Option<ImageDelivery>,
    pub poll_interval_seconds: Option<u64>,
    pub max_polls: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceConfig {
    pub name: Option<String>,
}

/// Cookies for the Bing image creator
#[derive(Debug, Clone)]
pub struct BingCredentials {
    /// `_U` session cookie
    pub auth_cookie: Secret,
    /// Optional `SRCHHPGUSR` identity cookie
    pub identity_cookie: Option<Secret>,
}

/// Filesystem locations used by the job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub work_dir: PathBuf,
    pub default_image: PathBuf,
    pub voice_dir: PathBuf,
}

/// Image provider tuning shared by all providers
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub delivery: ImageDelivery,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

/// Resolved configuration for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    /// Cookie provider credentials; provider skipped when absent
    pub bing: Option<BingCredentials>,
    /// Programmatic provider key; provider skipped when absent
    pub dashscope_api_key: Option<Secret>,
    pub weather_api_key: Option<Secret>,
    pub time_zone: Tz,
    pub paths: ResolvedPaths,
    /// Bound applied to every outbound request
    pub http_timeout: Duration,
    pub weather_location: String,
    pub images: ImageSettings,
    pub voice: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and working directory
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load(|key| std::env::var(key).ok(), &cwd)
    }

    /// Load configuration with an explicit environment lookup
    pub fn load<F>(env: F, cwd: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let bot_token = lookup(ENV_TELEGRAM_TOKEN).ok_or(ConfigError::Missing(ENV_TELEGRAM_TOKEN))?;
        let chat_id = lookup(ENV_CHAT_ID).ok_or(ConfigError::Missing(ENV_CHAT_ID))?;

        let zone_name = lookup(ENV_TIME_ZONE).unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let time_zone: Tz = zone_name
            .parse()
            .map_err(|_| ConfigError::InvalidTimeZone(zone_name.clone()))?;

        let config_file = match lookup(ENV_CONFIG_PATH) {
            Some(path) => Some(PathBuf::from(path)),
            None => find_config_file(cwd),
        };

        let (file, base_dir) = match config_file {
            Some(ref path) => {
                let file = load_config_file(path)?;
                // Base directory is the parent of .daybreak/
                let base = path
                    .parent()
                    .and_then(|p| p.parent())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                (file, base)
            }
            None => (ConfigFile::default(), cwd.to_path_buf()),
        };

        let resolve = |configured: &Option<String>, default: &str| match configured {
            Some(p) => resolve_path(&base_dir, p),
            None => cwd.join(default),
        };

        let paths = ResolvedPaths {
            work_dir: resolve(&file.paths.work_dir, DEFAULT_WORK_DIR),
            default_image: resolve(&file.paths.default_image, DEFAULT_IMAGE),
            voice_dir: resolve(&file.paths.voice_dir, DEFAULT_VOICE_DIR),
        };

        let bing = lookup(ENV_BING_TOKEN).map(|token| BingCredentials {
            auth_cookie: Secret::new(token),
            identity_cookie: lookup(ENV_BING_SRCHHPGUSR).map(Secret::new),
        });

        Ok(Self {
            telegram: TelegramConfig {
                bot_token: Secret::new(bot_token),
                chat_id,
            },
            bing,
            dashscope_api_key: lookup(ENV_DASHSCOPE_API_KEY).map(Secret::new),
            weather_api_key: lookup(ENV_WEATHER_API_KEY).map(Secret::new),
            time_zone,
            paths,
            http_timeout: Duration::from_secs(
                file.http.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ),
            weather_location: file
                .weather
                .location
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            images: ImageSettings {
                delivery: file.images.delivery.unwrap_or_default(),
                poll_interval: Duration::from_secs(
                    file.images
                        .poll_interval_seconds
                        .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS),
                ),
                max_polls: file.images.max_polls.unwrap_or(DEFAULT_MAX_POLLS),
            },
            voice: file.voice.name.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            config_file,
        })
    }
}

/// Find config file by searching `start` and its parents, then the home directory
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".daybreak").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    dirs::home_dir()
        .map(|home| home.join(".daybreak").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
