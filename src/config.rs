//! Configuration loading from a TOML file and `FTPDTS_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{StoreError, StoreResult, DEFAULT_CACHE_TTL};
use crate::uid::generator::{DEFAULT_CHARS, DEFAULT_FORMAT, DEFAULT_VALIDATOR};
use crate::uid::UidGenerator;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "ftpdts.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "FTPDTS";

/// Store configuration. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub uid: UidConfig,
    pub log: LogConfig,
}

/// Persistent tier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one file per durable record.
    pub path: PathBuf,
    /// Create `path` at startup when it is missing. Off by default: a missing
    /// directory is fatal so a mistyped path cannot start an empty store.
    pub create: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
            create: false,
        }
    }
}

/// Memory tier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default lifetime, in seconds, of records written without a ttl.
    /// Must be positive; zero is the durable sentinel.
    pub data_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_ttl: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

/// Identifier generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UidConfig {
    /// Alphabet random characters are drawn from.
    pub chars: String,
    /// Format string; each `X` becomes a random character.
    pub format: String,
    /// Regex a candidate id must fully match.
    pub validator: String,
}

impl Default for UidConfig {
    fn default() -> Self {
        Self {
            chars: DEFAULT_CHARS.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            validator: DEFAULT_VALIDATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a TOML config file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StoreError::io("read config", path, e))?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            StoreError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `ftpdts.toml` when present, else defaults;
    /// then apply environment overrides.
    pub fn load_or_default(explicit: Option<&Path>) -> StoreResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Save as pretty-printed TOML.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("Failed to encode config: {e}")))?;
        std::fs::write(path, content).map_err(|e| StoreError::io("write config", path, e))
    }

    /// Apply `FTPDTS_DATA_PATH`, `FTPDTS_CACHE_DATA_TTL` and `FTPDTS_LOG_LEVEL`.
    pub fn apply_env(&mut self) -> StoreResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> StoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        if let Some(path) = var("DATA_PATH") {
            self.data.path = PathBuf::from(path);
        }
        if let Some(ttl) = var("CACHE_DATA_TTL") {
            self.cache.data_ttl = ttl.trim().parse().map_err(|_| {
                StoreError::Config(format!("{ENV_PREFIX}_CACHE_DATA_TTL is not a number: {ttl:?}"))
            })?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        self.validate()
    }

    /// Reject values the store cannot honour.
    pub fn validate(&self) -> StoreResult<()> {
        if self.cache.data_ttl == 0 {
            return Err(StoreError::Config(
                "cache.data_ttl must be positive; 0 would make every cached record look durable"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Default ttl for the memory tier.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.data_ttl)
    }

    /// Build the identifier generator described by `[uid]`.
    pub fn uid_generator(&self) -> StoreResult<UidGenerator> {
        UidGenerator::new(&self.uid.chars, &self.uid.format, &self.uid.validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[cache]\ndata_ttl = 60\n").unwrap();
        assert_eq!(config.default_ttl(), Duration::from_secs(60));
        assert_eq!(config.data, DataConfig::default());
        assert_eq!(config.uid, UidConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FTPDTS_DATA_PATH", "/srv/records"),
            ("FTPDTS_CACHE_DATA_TTL", " 5 "),
            ("FTPDTS_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.data.path, PathBuf::from("/srv/records"));
        assert_eq!(config.cache.data_ttl, 5);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_bad_ttl_override_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|k| {
            (k == "FTPDTS_CACHE_DATA_TTL").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ftpdts.toml");
        let mut config = Config::default();
        config.cache.data_ttl = 42;
        config.uid.format = "XXXX-XXXX".to_string();
        config.uid.validator = "[A-Z0-9]{4}-[A-Z0-9]{4}".to_string();

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.uid_generator().is_ok());
    }

    #[test]
    fn test_zero_data_ttl_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ftpdts.toml");
        std::fs::write(&path, "[cache]\ndata_ttl = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(StoreError::Config(_))));

        let mut config = Config::default();
        let result = config
            .apply_overrides(|k| (k == "FTPDTS_CACHE_DATA_TTL").then(|| "0".to_string()));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_data_create_defaults_off() {
        let config: Config = toml::from_str("[data]\npath = \"/srv/records\"\n").unwrap();
        assert!(!config.data.create);
        let config: Config = toml::from_str("[data]\ncreate = true\n").unwrap();
        assert!(config.data.create);
        assert_eq!(config.data.path, PathBuf::from("./data"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[cache\ndata_ttl = ").unwrap();
        assert!(matches!(Config::load(&path), Err(StoreError::Config(_))));
    }
}
