use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{retry::DEFAULT_MAX_RETRIES, units::UnitSystem};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Credentials kept alongside the config, standing in for a platform secret store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Secrets {
    pub openweather_api_key: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// units = "metric"
/// default_city = "Seoul"
/// default_country = "KR"
///
/// [secrets]
/// openweather_api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub units: UnitSystem,
    pub default_city: String,
    pub default_country: String,
    /// How long a presentation layer may reuse a response. Not used by the client.
    pub cache_ttl_seconds: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    /// Where the local store keeps its files. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub secrets: Secrets,

    /// Key taken from the environment; never written back to disk.
    #[serde(skip)]
    env_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            default_city: "Seoul".to_string(),
            default_country: "KR".to_string(),
            cache_ttl_seconds: 600,
            request_timeout_secs: 10,
            max_retries: DEFAULT_MAX_RETRIES,
            data_dir: None,
            secrets: Secrets::default(),
            env_api_key: None,
        }
    }
}

impl Config {
    /// Load config from disk (or defaults on first run), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from a specific file without environment overrides.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.env_api_key = Some(key);
        }
        if let Some(city) = get("DEFAULT_CITY") {
            self.default_city = city;
        }
        if let Some(country) = get("DEFAULT_COUNTRY") {
            self.default_country = country;
        }
        if let Some(ttl) = get("CACHE_TTL_SECONDS") {
            match ttl.trim().parse() {
                Ok(ttl) => self.cache_ttl_seconds = ttl,
                Err(_) => tracing::warn!(value = %ttl, "ignoring invalid CACHE_TTL_SECONDS"),
            }
        }
        if let Some(units) = get("WEATHER_UNITS") {
            match UnitSystem::try_from(units.as_str()) {
                Ok(units) => self.units = units,
                Err(err) => tracing::warn!("ignoring WEATHER_UNITS: {err}"),
            }
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform directories"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding favorites, history and saved records.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Effective API key: the environment wins over the stored secret.
    pub fn api_key(&self) -> Option<&str> {
        self.env_api_key
            .as_deref()
            .or(self.secrets.openweather_api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.secrets.openweather_api_key = Some(api_key);
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// `"Seoul,KR"`
    pub fn default_location(&self) -> String {
        if self.default_country.trim().is_empty() {
            self.default_city.clone()
        } else {
            format!("{},{}", self.default_city, self.default_country)
        }
    }
}
