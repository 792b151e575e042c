//! Configuration for the crm-auth tool.

use std::path::{Path, PathBuf};

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

/// Supabase project to talk to.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g. https://<ref>.supabase.co)
    pub url: String,
    /// Public anon key
    pub anon_key: String,
}

/// Where the local key-value store lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Access rules applied by `can-access`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Resources only administrators may touch.
    #[serde(default = "default_admin_only_resources")]
    pub admin_only_resources: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_only_resources: default_admin_only_resources(),
        }
    }
}

// Default values
const DEFAULT_STORAGE_PATH: &str = ".crm-auth/local-storage.json";

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_PATH)
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_admin_only_resources() -> Vec<String> {
    vec!["sales".to_string()]
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (CRM_AUTH__SECTION__KEY format)
    /// 2. The given file, or crm-auth.toml if present
    /// 3. Built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("crm-auth").required(false),
        };

        let config = ConfigLoader::builder()
            .set_default("storage.path", DEFAULT_STORAGE_PATH)?
            .set_default("logging.level", default_log_level())?
            .add_source(file)
            .add_source(
                Environment::with_prefix("CRM_AUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
