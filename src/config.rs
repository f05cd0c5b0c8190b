//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/solar-market/config.toml`).
//! Every section and field has a default, so a partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::DatabaseConfig;
use crate::interfaces::http::ServiceSettings;

/// Env var overriding the config file location
pub const CONFIG_ENV: &str = "SOLAR_MARKET_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            url: db.url,
            max_connections: db.max_connections,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_hours: 24,
        }
    }
}

impl std::fmt::Debug for SecuritySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuritySection")
            .field("jwt_secret", &"***")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .finish()
    }
}

/// Account created on first boot when the user table is empty
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSection {
    pub email: String,
    pub password: String,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            email: "admin@solar-market.local".to_string(),
            password: "admin123".to_string(),
        }
    }
}

impl std::fmt::Debug for AdminSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSection")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSection {
    /// Run the periodic billing task
    pub enabled: bool,
    pub interval_hours: u64,
    /// Consumption used for every annual charge (kWh/year)
    pub assumed_annual_consumption_kwh: u32,
    pub invoice_due_days: u32,
    /// Fee of one issued energy certificate
    pub certificate_fee_cents: i64,
}

impl Default for BillingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 24,
            assumed_annual_consumption_kwh: 3500,
            invoice_due_days: 30,
            certificate_fee_cents: 15_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub security: SecuritySection,
    pub admin: AdminSection,
    pub logging: LoggingSection,
    pub billing: BillingSection,
    /// Echo internal error detail in API responses
    pub dev_mode: bool,
}

impl AppConfig {
    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret is empty".into()));
        }
        if self.security.jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid(
                "security.jwt_expiration_hours must be positive".into(),
            ));
        }
        if self.billing.interval_hours == 0 {
            return Err(ConfigError::Invalid(
                "billing.interval_hours must be at least 1".into(),
            ));
        }
        if self.billing.certificate_fee_cents < 0 {
            return Err(ConfigError::Invalid(
                "billing.certificate_fee_cents must not be negative".into(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "logging.format '{}' (expected text or json)",
                other
            ))),
        }
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(
            self.security.jwt_secret.clone(),
            self.security.jwt_expiration_hours,
        )
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            jwt: self.jwt_config(),
            invoice_due_days: self.billing.invoice_due_days,
            annual_consumption_kwh: self.billing.assumed_annual_consumption_kwh,
            certificate_fee_cents: self.billing.certificate_fee_cents,
            dev_mode: self.dev_mode,
        }
    }
}

/// `$SOLAR_MARKET_CONFIG`, else `~/.config/solar-market/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("solar-market")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            dev_mode = true

            [server]
            api_port = 9090

            [billing]
            assumed_annual_consumption_kwh = 4000
            "#,
        )
        .unwrap();
        assert!(config.dev_mode);
        assert_eq!(config.server.api_port, 9090);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.billing.assumed_annual_consumption_kwh, 4000);
        assert_eq!(config.billing.invoice_due_days, 30);
        assert_eq!(config.security.jwt_expiration_hours, 24);
        assert_eq!(config.service_settings().annual_consumption_kwh, 4000);
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = AppConfig::from_toml("[logging]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn syntax_error_names_the_file() {
        let dir = std::env::temp_dir().join(format!("solar-market-cfg-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[server\napi_port = 1").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"), "{err}");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("solar-market-cfg-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.billing.certificate_fee_cents = 19_900;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.billing.certificate_fee_cents, 19_900);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn secrets_are_not_debug_printed() {
        let rendered = format!("{:?}", AppConfig::default());
        assert!(!rendered.contains("admin123"));
        assert!(!rendered.contains("change-me"));
    }
}
