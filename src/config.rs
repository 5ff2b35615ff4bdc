//! Layered configuration loading using figment.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User-level `~/.config/cafe-pos/config.toml`
//! 3. Project-level `./cafe-pos.toml`
//! 4. An explicit file passed with `--config`
//! 5. Environment variables (`CAFE_POS_*` prefix, `__` as separator),
//!    e.g. `CAFE_POS_STORE__BACKEND=sqlite`

use crate::menu::Menu;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CAFE_POS_";
pub const PROJECT_CONFIG_FILE: &str = "cafe-pos.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PosConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub shop: ShopConfig,
    #[serde(default)]
    pub menu: Menu,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Csv,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory holding the CSV files, the SQLite database, and the log file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// SQLite file name, relative to `data_dir` unless absolute
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database() -> PathBuf {
    PathBuf::from("cafe.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
            database: default_database(),
        }
    }
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            self.data_dir.join(&self.database)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopConfig {
    #[serde(default = "default_shop_name")]
    pub name: String,

    /// Prefix for displayed amounts ("P1,234.50")
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_shop_name() -> String {
    "Cafe POS".to_string()
}

fn default_currency() -> String {
    "P".to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: default_shop_name(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl PosConfig {
    /// Load from every source. `explicit` is the `--config` path, if any.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: PosConfig = Self::figment(explicit)?.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain. Public so tests can layer on top of it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let local = PathBuf::from(PROJECT_CONFIG_FILE);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cafe-pos").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.menu.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "menu".to_string(),
                reason: "at least one item is required".to_string(),
            });
        }

        if let Some((name, price)) = self.menu.iter().find(|(_, p)| !p.is_finite() || *p < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: format!("menu.{}", name),
                reason: format!("price must be a non-negative number, got {}", price),
            });
        }

        Ok(())
    }

    /// Log file location for the terminal UI
    pub fn log_path(&self) -> PathBuf {
        self.store.data_dir.join("cafe-pos.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = PosConfig::default();

        assert_eq!(config.store.backend, StoreBackend::Csv);
        assert_eq!(config.store.database_path(), PathBuf::from("data/cafe.db"));
        assert_eq!(config.shop.currency, "P");
        assert_eq!(config.menu.price("Latte"), Some(150.0));
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_project_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                PROJECT_CONFIG_FILE,
                r#"
                [store]
                backend = "sqlite"
                data_dir = "/var/lib/cafe"

                [shop]
                currency = "$"
                "#,
            )?;
            jail.set_env("CAFE_POS_SHOP__NAME", "Corner Cafe");

            let config: PosConfig = PosConfig::figment(None)
                .map_err(|e| e.to_string())?
                .extract()?;

            assert_eq!(config.store.backend, StoreBackend::Sqlite);
            assert_eq!(config.store.database_path(), PathBuf::from("/var/lib/cafe/cafe.db"));
            assert_eq!(config.shop.currency, "$");
            assert_eq!(config.shop.name, "Corner Cafe");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = PosConfig::figment(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_negative_menu_price_is_invalid() {
        let mut config = PosConfig::default();
        config.menu.insert("Free Refill", -1.0);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
