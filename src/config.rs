//! Configuration loading from TOML files and environment variables.
//!
//! Precedence (highest wins):
//! 1. Environment variables (`KIROSWITCH_REGION`, `KIROSWITCH_START_URL`,
//!    `KIROSWITCH_TOKENS_DIR`, `KIROSWITCH_IDE_STORAGE_DIR`,
//!    `KIROSWITCH_QUOTA_BASE_URL`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./kiroswitch.toml in the current directory
//! 4. ~/.config/kiroswitch/kiroswitch.toml
//! 5. Built-in defaults

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::kiro;
use crate::mail::MailApiVersion;
use crate::oauth::{DEFAULT_REGION, DEFAULT_START_URL};
use crate::quota::DEFAULT_QUOTA_BASE_URL;

/// Default overall registration timeout in seconds.
const DEFAULT_REGISTRATION_TIMEOUT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Toml(err) => write!(f, "toml: {err}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Mail-provider selection. The adapter version is explicit configuration;
/// response payloads are never sniffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub base_url: Option<String>,
    pub api_version: MailApiVersion,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub region: String,
    pub start_url: String,
    pub tokens_dir: PathBuf,
    pub ide_auth_path: PathBuf,
    pub quota_base_url: String,
    pub registration_timeout_secs: u64,
    pub mail: MailConfig,
}

/// On-disk TOML shape; everything optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    region: Option<String>,
    start_url: Option<String>,
    tokens_dir: Option<String>,
    ide_storage_dir: Option<String>,
    quota_base_url: Option<String>,
    registration_timeout_secs: Option<u64>,
    #[serde(default)]
    mail: FileMailConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileMailConfig {
    base_url: Option<String>,
    api_version: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        dirs::home_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FHome>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    home_dir: FHome,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FHome: Fn() -> Option<PathBuf>,
{
    let file = read_file_config(path_override, &read_file, &home_dir)?;

    let region = env_lookup("KIROSWITCH_REGION")
        .or(file.region)
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let start_url = env_lookup("KIROSWITCH_START_URL")
        .or(file.start_url)
        .unwrap_or_else(|| DEFAULT_START_URL.to_string());
    let quota_base_url = env_lookup("KIROSWITCH_QUOTA_BASE_URL")
        .or(file.quota_base_url)
        .unwrap_or_else(|| DEFAULT_QUOTA_BASE_URL.to_string());

    let tokens_dir = env_lookup("KIROSWITCH_TOKENS_DIR")
        .or(file.tokens_dir)
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".kiroswitch").join("tokens")))
        .ok_or_else(|| {
            ConfigError::Invalid("cannot resolve a tokens directory; set tokens_dir".to_string())
        })?;

    let ide_auth_path = env_lookup("KIROSWITCH_IDE_STORAGE_DIR")
        .or(file.ide_storage_dir)
        .map(|dir| kiro::auth_token_path(Path::new(&dir)))
        .or_else(|| kiro::default_storage_root().as_deref().map(kiro::auth_token_path))
        .ok_or_else(|| {
            ConfigError::Invalid(
                "cannot resolve the IDE storage directory; set ide_storage_dir".to_string(),
            )
        })?;

    let api_version_name = file.mail.api_version.unwrap_or_else(|| "v2".to_string());
    let api_version = MailApiVersion::parse(&api_version_name).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "unknown mail.api_version `{api_version_name}` (expected v1 or v2)"
        ))
    })?;

    Ok(Config {
        region,
        start_url,
        tokens_dir,
        ide_auth_path,
        quota_base_url,
        registration_timeout_secs: file
            .registration_timeout_secs
            .unwrap_or(DEFAULT_REGISTRATION_TIMEOUT_SECS),
        mail: MailConfig {
            base_url: file.mail.base_url,
            api_version,
        },
    })
}

fn read_file_config<FRead, FHome>(
    path_override: Option<&str>,
    read_file: &FRead,
    home_dir: &FHome,
) -> Result<FileConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FHome: Fn() -> Option<PathBuf>,
{
    // Explicit path: a missing file is an error the user should see.
    if let Some(path) = path_override {
        let text = read_file(Path::new(path))?;
        return Ok(toml::from_str(&text)?);
    }

    let mut candidates = vec![PathBuf::from("kiroswitch.toml")];
    if let Some(home) = home_dir() {
        candidates.push(home.join(".config").join("kiroswitch").join("kiroswitch.toml"));
    }
    for candidate in candidates {
        match read_file(&candidate) {
            Ok(text) => return Ok(toml::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(ConfigError::Io(err)),
        }
    }
    Ok(FileConfig::default())
}
