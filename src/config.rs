use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub session: SessionConfig,

    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/blog.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Whether to set the Secure flag on session cookies.
    /// Leave false for plain-HTTP local serving; set true behind TLS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie-signing secret, at least 64 bytes. Supplied via
    /// `QUILLET_SESSION_SECRET`; when empty an ephemeral key is generated
    /// at startup and sessions do not survive a restart.
    pub secret: String,

    /// Session expiry on inactivity, in minutes.
    pub expiry_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiry_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    /// Relay account; env `QUILLET_SMTP_USERNAME` overrides.
    pub username: String,

    /// Relay password; env `QUILLET_SMTP_PASSWORD` overrides.
    pub password: String,

    /// Where contact-form messages are delivered; env
    /// `QUILLET_MAIL_RECIPIENT` overrides.
    pub recipient: String,

    /// SMTP connect/response timeout in seconds (default: 10)
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            recipient: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets are supplied out-of-band; the environment always wins over
    /// the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.general.database_url = url;
        }
        if let Ok(secret) = std::env::var("QUILLET_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Ok(username) = std::env::var("QUILLET_SMTP_USERNAME") {
            self.mail.username = username;
        }
        if let Ok(password) = std::env::var("QUILLET_SMTP_PASSWORD") {
            self.mail.password = password;
        }
        if let Ok(recipient) = std::env::var("QUILLET_MAIL_RECIPIENT") {
            self.mail.recipient = recipient;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("quillet").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".quillet").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.mail.enabled {
            if self.mail.smtp_host.is_empty() {
                anyhow::bail!("SMTP host cannot be empty when mail is enabled");
            }
            if self.mail.username.is_empty() || self.mail.password.is_empty() {
                anyhow::bail!(
                    "SMTP credentials must be set when mail is enabled \
                     (QUILLET_SMTP_USERNAME / QUILLET_SMTP_PASSWORD)"
                );
            }
            if self.mail.recipient.is_empty() {
                anyhow::bail!("Mail recipient must be set when mail is enabled");
            }
        }

        if self.session.expiry_minutes <= 0 {
            anyhow::bail!("Session expiry must be > 0 minutes");
        }

        if !self.session.secret.is_empty() && self.session.secret.len() < 32 {
            anyhow::bail!("Session secret must be at least 32 bytes");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.general.database_url, "sqlite:data/blog.db");
        assert_eq!(config.session.expiry_minutes, 60);
        assert!(!config.mail.enabled);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[mail]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [server]
            port = 8080
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.port, 8080);

        assert_eq!(config.mail.smtp_port, 587);
    }

    #[test]
    fn test_validate_rejects_mail_without_credentials() {
        let mut config = Config::default();
        config.mail.enabled = true;
        assert!(config.validate().is_err());

        config.mail.username = "owner@example.com".to_string();
        config.mail.password = "app-password".to_string();
        config.mail.recipient = "owner@example.com".to_string();
        assert!(config.validate().is_ok());
    }
}
